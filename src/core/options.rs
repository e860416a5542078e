//! Construction options shared by the concrete adapters

use super::level::Level;
use super::record::Attr;
use super::timestamp::TimestampFormat;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Rewrites or drops an attribute before it is serialized.
///
/// The first argument is the group path leading to the attribute (empty for
/// top-level attributes and the built-in `time`, `level`, `msg` and `source`
/// keys). Returning `None` removes the attribute.
pub type ReplaceAttrFn = Arc<dyn Fn(&[String], Attr) -> Option<Attr> + Send + Sync>;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";
pub const SOURCE_KEY: &str = "source";

/// Per-adapter configuration
///
/// Deserializable so it can live in an application's config file; the
/// rewrite function can only be set from code.
///
/// # Example
///
/// ```
/// use rust_log_pipeline::core::{AdapterOptions, Level, TimestampFormat};
///
/// let opts: AdapterOptions =
///     serde_json::from_str(r#"{"level":"debug","time_format":"kitchen"}"#).unwrap();
/// assert_eq!(opts.level, Level::DEBUG);
/// assert_eq!(opts.time_format, TimestampFormat::Kitchen);
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    /// Minimum level this adapter emits
    pub level: Level,
    pub time_format: TimestampFormat,
    /// Leave the timestamp out of every line
    pub omit_time: bool,
    /// Render the call-site location when the record carries one
    pub add_source: bool,
    #[serde(skip)]
    pub replace_attr: Option<ReplaceAttrFn>,
}

impl AdapterOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, format: TimestampFormat) -> Self {
        self.time_format = format;
        self
    }

    #[must_use]
    pub fn with_omit_time(mut self, omit: bool) -> Self {
        self.omit_time = omit;
        self
    }

    #[must_use]
    pub fn with_add_source(mut self, add: bool) -> Self {
        self.add_source = add;
        self
    }

    #[must_use]
    pub fn with_replace_attr<F>(mut self, replace: F) -> Self
    where
        F: Fn(&[String], Attr) -> Option<Attr> + Send + Sync + 'static,
    {
        self.replace_attr = Some(Arc::new(replace));
        self
    }

    /// Run a built-in key through the rewrite function, if any
    pub(crate) fn rewrite_builtin(&self, attr: Attr) -> Option<Attr> {
        match &self.replace_attr {
            Some(replace) => replace(&[], attr),
            None => Some(attr),
        }
    }
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("level", &self.level)
            .field("time_format", &self.time_format)
            .field("omit_time", &self.omit_time)
            .field("add_source", &self.add_source)
            .field("replace_attr", &self.replace_attr.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
