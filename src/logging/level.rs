use core::fmt;
use std::str::FromStr;

/// Severity of a log call, ordered from most verbose to most severe.
///
/// `All` and `Off` are threshold sentinels: a threshold of `All` admits every
/// call, a threshold of `Off` suppresses every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    #[default]
    All = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Off = 6,
}

impl Level {
    pub const LEVELS: [Level; 7] = [
        Level::All,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Off,
    ];

    /// A call at `level` passes a threshold of `self` iff `self <= level`.
    /// Nothing is ever logged at `Off`, so an `Off` threshold admits nothing.
    #[inline]
    pub fn admits(self, level: Level) -> bool {
        level != Level::Off && self <= level
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::All => "all",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Off => "off",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::All,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            5 => Level::Fatal,
            _ => Level::Off,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                eyre::eyre!(
                    "unknown log level '{}', expected one of all, debug, info, warn, error, fatal, off",
                    s
                )
            })
    }
}
