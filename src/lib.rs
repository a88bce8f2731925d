//! Leveled logging that fans each line out to any number of sinks.
//!
//! Build one [`Logger`] at the start of the program, attach sinks, and pass
//! the `Arc` around:
//!
//! ```no_run
//! use std::sync::Arc;
//! use fanlog::{FileSinkOptions, Level, Logger, StdoutSink};
//!
//! let logger = Arc::new(Logger::default());
//! logger.set_level(Level::Info);
//! logger.add_sink(logger.file_sink("app.log", FileSinkOptions::default()));
//! logger.add_sink(Arc::new(StdoutSink::new()));
//!
//! fanlog::info!(logger, "listening on {}", 8080);
//! logger.shutdown();
//! ```
//!
//! Lines look like `[info] main[main.rs:12] listening on 8080`.

mod macros;

pub mod config;
pub mod logging;

pub use logging::*;
