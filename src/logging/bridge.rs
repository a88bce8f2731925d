use std::sync::Arc;

use log::{Log, Metadata};

use super::{CallSite, Level, Logger};

/// Feeds records from the `log` facade into a [`Logger`].
pub(crate) struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub(crate) fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.logger.is_enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let level = map_level(record.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        // The facade knows the module, not the function.
        let site = CallSite::from_parts(
            record.module_path_static(),
            record.file_static(),
            record.line(),
        );
        self.logger.log_at(level, site, *record.args());
    }

    fn flush(&self) {
        self.logger.flush()
    }
}

fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}
