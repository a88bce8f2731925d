//! Leveled logging macros.
//!
//! Each macro takes the logger (anything that derefs to [`Logger`](crate::Logger))
//! followed by `format!` style arguments, and tags the line with the enclosing
//! function, file and line:
//!
//! ```
//! use std::sync::Arc;
//! use fanlog::{Logger, MemorySink};
//!
//! let logger = Arc::new(Logger::default());
//! let memory = Arc::new(MemorySink::new());
//! logger.add_sink(memory.clone());
//!
//! fanlog::warn!(logger, "retrying in {}s", 5);
//! assert!(memory.lines()[0].starts_with("[warn] "));
//! ```
//!
//! Nothing is formatted when the level is below the logger's threshold.

/// Path of the function the macro is expanded in, e.g. `app::server::run`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __fanlog_here() {}
        fn __fanlog_type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = __fanlog_type_name_of(__fanlog_here);
        match name.strip_suffix("::__fanlog_here") {
            Some(function) => function,
            None => name,
        }
    }};
}

#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new($crate::function_name!(), file!(), line!())
    };
}

#[macro_export]
macro_rules! log_at {
    ($logger:expr, $lvl:expr, $($arg:tt)+) => {{
        let __logger = &$logger;
        let __level: $crate::Level = $lvl;
        if __logger.is_enabled(__level) {
            __logger.log_at(__level, $crate::call_site!(), format_args!($($arg)+));
        }
    }};
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
