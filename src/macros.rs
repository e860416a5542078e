//! Logging macros that capture the call site.
//!
//! Each macro formats its message like `format!` and records the file, line
//! and module it was invoked from. Attributes go in an optional braced block
//! before the format string. The message is only formatted when the level
//! passes the logger's minimum.
//!
//! # Examples
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//! use rust_log_pipeline::{info, warn};
//!
//! let logger = Logger::new();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, { "port" => port, "tls" => true }, "Listening on port {}", port);
//! warn!(logger, "Retry {} of {}", 1, 3);
//! ```

/// Build a `Vec<Attr>` from `key => value` pairs.
///
/// ```
/// use rust_log_pipeline::{attrs, Value};
///
/// let attrs = attrs!["user" => "ada", "attempts" => 3];
/// assert_eq!(attrs[1].value, Value::Int(3));
/// ```
#[macro_export]
macro_rules! attrs {
    ($($key:expr => $value:expr),* $(,)?) => {
        vec![$($crate::Attr::new($key, $value)),*]
    };
}

/// Log a message at an explicit level.
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_pipeline::log;
/// log!(logger, Level::INFO, "Simple message");
/// log!(logger, Level::new(6), { "code" => 500 }, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, { $($key:expr => $value:expr),* $(,)? }, $($arg:tt)+) => {{
        let __logger = &$logger;
        let __level: $crate::Level = $level;
        if __level.passes(__logger.level()) {
            __logger.log_at(
                __level,
                format!($($arg)+),
                $crate::attrs![$($key => $value),*],
                $crate::Source::new(file!(), line!(), module_path!()),
            );
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $crate::log!($logger, $level, {}, $($arg)+)
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::TRACE, $($arg)+)
    };
}

/// Log a verbose-level message.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::VERBOSE, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

/// Log a success-level message.
#[macro_export]
macro_rules! success {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::SUCCESS, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::NOTICE, $($arg)+)
    };
}

/// Log a deprecation notice.
#[macro_export]
macro_rules! deprecated {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEPRECATED, $($arg)+)
    };
}

/// Log a warning.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARN, $($arg)+)
    };
}

/// Log an error.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}

/// Log a bug: a condition the program should never reach.
#[macro_export]
macro_rules! bug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::BUG, $($arg)+)
    };
}

/// Log a fatal error. Does not exit.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::FATAL, $($arg)+)
    };
}

/// Log a message that passes any non-quiet minimum level.
#[macro_export]
macro_rules! always {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ALWAYS, $($arg)+)
    };
}
