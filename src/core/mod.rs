//! Core pipeline types: levels, records, handlers and buffering

pub mod adapter;
pub mod attr_map;
pub mod buffered;
pub mod error;
pub mod handler;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod options;
pub mod record;
pub mod timestamp;

pub use adapter::{Adapter, DiscardAdapter};
pub use attr_map::{flatten, AttrMap, AttrMapPool, MapValue, MAX_POOLED_SIZE};
pub use buffered::{BufferedAdapter, BufferedAdapterBuilder, OverflowCallback, DEFAULT_BUFFER_CAPACITY};
pub use error::{LoggerError, Result};
pub use handler::Handler;
pub use level::Level;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use options::{AdapterOptions, ReplaceAttrFn};
pub use record::{Attr, Record, Source, Value};
pub use timestamp::TimestampFormat;
