use core::fmt;
use std::{
    cell::Cell,
    io::Write,
    path::PathBuf,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use chrono::format::{Item, StrftimeItems};
use eyre::Context;

use super::{
    bridge::LogBridge,
    file_sink::{FileSink, FileSinkOptions},
    formatters::{LongFormatter, Record, ShortFormatter},
    sinks::{StderrSink, StdoutSink},
    CallSite, Level, LogFormatter, LogSink,
};

pub const DEFAULT_DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct Config {
    pub threshold: Level,
    pub long_format: bool,
    pub datetime_format: String,
    pub file: Option<PathBuf>,
    pub file_options: FileSinkOptions,
    pub stdout: bool,
    pub stderr: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            threshold: Level::All,
            long_format: false,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            file: None,
            file_options: FileSinkOptions::default(),
            stdout: false,
            stderr: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside [`Logger::log`] for as long as it lives.
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Option<Self> {
        DISPATCHING.with(|flag| {
            if flag.replace(true) {
                None
            } else {
                Some(DispatchGuard)
            }
        })
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

/// Last resort for lines that cannot go through any sink.
pub(crate) fn bootstrap(line: &str) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", line);
}

/// Gates log calls on a severity threshold and fans the surviving lines out
/// to every attached sink, in the order the sinks were attached.
///
/// An application builds one logger at startup and hands out clones of the
/// `Arc`; tests build as many as they like.
pub struct Logger {
    threshold: AtomicU8,
    sinks: RwLock<Vec<Arc<dyn LogSink>>>,
    formatter: Box<dyn LogFormatter>,
}

impl Logger {
    pub fn new(threshold: Level, formatter: Box<dyn LogFormatter>) -> Self {
        Self {
            threshold: AtomicU8::new(threshold as u8),
            sinks: RwLock::new(Vec::new()),
            formatter,
        }
    }

    /// Routes the `log` crate macros through this logger.
    pub fn init(self: &Arc<Self>) -> eyre::Result<()> {
        log::set_boxed_logger(Box::new(LogBridge::new(self.clone())))
            .context("Failed registering boxed logger")?;
        log::set_max_level(log::LevelFilter::Trace);

        Ok(())
    }

    pub fn set_level(&self, level: Level) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        self.level().admits(level)
    }

    pub fn add_sink(&self, sink: Arc<dyn LogSink>) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Creates a file sink that reports its own failures through this logger.
    /// The sink is not attached.
    pub fn file_sink(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
        options: FileSinkOptions,
    ) -> Arc<FileSink> {
        FileSink::spawn(path, options, Arc::downgrade(self))
    }

    /// Hands `line` to every sink if `level` passes the threshold.
    ///
    /// Sinks run outside the lock, on a snapshot of the list taken when the
    /// call started. A sink that logs back into a logger from inside
    /// `accept` has its line written to stderr instead.
    pub fn log(&self, level: Level, line: &str) {
        if !self.is_enabled(level) {
            return;
        }

        let Some(_guard) = DispatchGuard::enter() else {
            bootstrap(line);
            return;
        };

        let sinks = self
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for sink in sinks.iter() {
            sink.accept(line);
        }
    }

    /// Formats a message tagged with `site` and dispatches it.
    pub fn log_at(&self, level: Level, site: CallSite, args: fmt::Arguments<'_>) {
        if !self.is_enabled(level) {
            return;
        }

        let line = self.formatter.format(&Record { level, site, args });
        self.log(level, &line);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Debug, CallSite::caller(), args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Info, CallSite::caller(), args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Warn, CallSite::caller(), args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Error, CallSite::caller(), args);
    }

    /// Highest severity. Does not stop the process.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log_at(Level::Fatal, CallSite::caller(), args);
    }

    pub fn flush(&self) {
        for sink in self.snapshot() {
            sink.flush();
        }
    }

    /// Closes every sink in attachment order. File sinks write what they have
    /// queued and release their files.
    pub fn shutdown(&self) {
        for sink in self.snapshot() {
            sink.close();
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn LogSink>> {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Level::All, Box::new(ShortFormatter::new()))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.level())
            .field("sinks", &self.sink_count())
            .finish()
    }
}

pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn with_level(self, threshold: Level) -> Self {
        Self {
            config: Config {
                threshold,
                ..self.config
            },
        }
    }

    pub fn with_long_format(self, long_format: bool) -> Self {
        Self {
            config: Config {
                long_format,
                ..self.config
            },
        }
    }

    pub fn with_datetime_format(self, datetime_format: impl Into<String>) -> Self {
        Self {
            config: Config {
                datetime_format: datetime_format.into(),
                ..self.config
            },
        }
    }

    pub fn with_file_sink(self, path: impl Into<PathBuf>) -> Self {
        Self {
            config: Config {
                file: Some(path.into()),
                ..self.config
            },
        }
    }

    pub fn with_file_options(self, file_options: FileSinkOptions) -> Self {
        Self {
            config: Config {
                file_options,
                ..self.config
            },
        }
    }

    pub fn with_stdout_sink(self) -> Self {
        Self {
            config: Config {
                stdout: true,
                ..self.config
            },
        }
    }

    pub fn with_stderr_sink(self) -> Self {
        Self {
            config: Config {
                stderr: true,
                ..self.config
            },
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the logger and attaches the configured sinks: file first, then
    /// stdout, then stderr.
    pub fn build(&self) -> eyre::Result<Arc<Logger>> {
        let config = &self.config;

        if config.long_format
            && StrftimeItems::new(&config.datetime_format).any(|item| matches!(item, Item::Error))
        {
            return Err(eyre::eyre!(
                "Invalid datetime format '{}'",
                config.datetime_format
            ));
        }

        let formatter: Box<dyn LogFormatter> = if config.long_format {
            Box::new(LongFormatter::new(config.clone()))
        } else {
            Box::new(ShortFormatter::new())
        };

        let logger = Arc::new(Logger::new(config.threshold, formatter));

        if let Some(path) = &config.file {
            if path.as_os_str().is_empty() {
                return Err(eyre::eyre!("Log file path is empty"));
            }
            logger.add_sink(logger.file_sink(path.clone(), config.file_options));
        }

        if config.stdout {
            logger.add_sink(Arc::new(StdoutSink::new()));
        }

        if config.stderr {
            logger.add_sink(Arc::new(StderrSink::new()));
        }

        Ok(logger)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
