//! # Rust Log Pipeline
//!
//! A structured-event logging pipeline: a [`Logger`] builds immutable
//! [`Record`]s, a [`Handler`] gates them by level and fans them out to every
//! attached [`Adapter`], and adapters serialize them to wherever they write.
//!
//! ## Features
//!
//! - **Open level scale**: named levels from `TRACE` to `FATAL`, arbitrary
//!   intermediate values, plus the `ALWAYS` and `QUIET` sentinels
//! - **Derived handlers**: `with_attrs` / `with_group` share adapters with
//!   their parent and never mutate it
//! - **Clean shutdown**: `dispose` is idempotent and waits for in-flight calls
//! - **Bounded buffering**: [`BufferedAdapter`] batches records and drops
//!   (and counts) rather than block producers
//! - **Pooled flattening**: [`AttrMap`]s are recycled through a bounded pool
//!
//! ## Example
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//! use rust_log_pipeline::appenders::EncoderAdapter;
//!
//! # fn main() -> Result<()> {
//! let buffered = BufferedAdapter::new(EncoderAdapter::json(std::io::sink()), 1024);
//! let logger = Logger::builder()
//!     .level(Level::DEBUG)
//!     .adapter(buffered)
//!     .build();
//!
//! let requests = logger.with_group("request");
//! requests.info_attrs("handled", vec![Attr::new("status", 200)]);
//!
//! logger.dispose()?;
//! # Ok(())
//! # }
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAdapter;
    pub use crate::appenders::{EncoderAdapter, JsonEncoder, LogfmtEncoder};
    pub use crate::core::{
        Adapter, AdapterOptions, Attr, AttrMap, BufferedAdapter, DiscardAdapter, Handler, Level,
        Logger, LoggerBuilder, LoggerError, LoggerMetrics, Record, Result, TimestampFormat, Value,
    };
}

#[cfg(feature = "console")]
pub use appenders::ConsoleAdapter;
pub use appenders::{Encoder, EncoderAdapter, JsonEncoder, LogfmtEncoder};
pub use core::{
    flatten, Adapter, AdapterOptions, Attr, AttrMap, AttrMapPool, BufferedAdapter,
    BufferedAdapterBuilder, DiscardAdapter, Handler, Level, Logger, LoggerBuilder, LoggerError,
    LoggerMetrics, MapValue, OverflowCallback, Record, ReplaceAttrFn, Result, Source,
    TimestampFormat, Value,
};
