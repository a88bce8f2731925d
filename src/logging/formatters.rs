use core::fmt::{self, Write};

use super::{logger::Config, CallSite, Level, LogFormatter};

/// Everything a formatter needs to render one log line.
pub struct Record<'a> {
    pub level: Level,
    pub site: CallSite,
    pub args: fmt::Arguments<'a>,
}

/// Renders the caller's arguments into a string.
///
/// A `Display` impl that fails cuts the message short instead of panicking
/// the way `format!` would.
pub(crate) fn render_message(args: &fmt::Arguments<'_>) -> String {
    let mut msg = String::new();
    let _ = msg.write_fmt(*args);
    msg
}

/// `[info] function[file.rs:12] message`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortFormatter;

impl ShortFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl LogFormatter for ShortFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        format!(
            "[{}] {} {}",
            record.level,
            record.site.short_tag(),
            render_message(&record.args)
        )
    }
}

/// `2025/01/31 09:15:00 [info] in crate::module::function[src/module.rs:12] message`
pub struct LongFormatter {
    config: Config,
}

impl LongFormatter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn timestamp(&self) -> String {
        chrono::Local::now()
            .format(&self.config.datetime_format)
            .to_string()
    }
}

impl LogFormatter for LongFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        format!(
            "{} [{}] in {} {}",
            self.timestamp(),
            record.level,
            record.site.long_tag(),
            render_message(&record.args)
        )
    }
}
