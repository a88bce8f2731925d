mod bridge;
mod callsite;
mod file_sink;
mod formatters;
mod level;
mod logger;
mod sinks;

pub use callsite::CallSite;
pub use file_sink::{Backpressure, FileSink, FileSinkOptions, FileSinkStats, SinkState};
pub use formatters::{LongFormatter, Record, ShortFormatter};
pub use level::Level;
pub use logger::{Builder, Config, Logger, DEFAULT_DATETIME_FORMAT};
pub use sinks::{MemorySink, StderrSink, StdoutSink};

pub trait LogFormatter: Sync + Send {
    fn format(&self, record: &Record<'_>) -> String;
}

/// A destination for fully formatted log lines.
///
/// `accept` must not panic and must not report failures to the caller; a
/// sink deals with its own errors.
pub trait LogSink: Sync + Send {
    fn accept(&self, line: &str);

    fn flush(&self) {}

    /// Releases whatever the sink holds. Lines accepted afterwards may be lost.
    fn close(&self) {}
}
