//! Error types for the logging pipeline

use std::sync::Arc;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Errors surfaced by handlers and adapters.
///
/// The enum is `Clone` so that a handler can replay the outcome of its first
/// `dispose()` to every later caller. Non-clonable sources are held in `Arc`.
///
/// Records dropped because a buffer was full are never reported through this
/// type; they are counted by [`LoggerMetrics`](super::LoggerMetrics) instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoggerError {
    /// Operation attempted after the handler or adapter was disposed
    #[error("handler disposed")]
    Disposed,

    /// The underlying sink rejected a write
    #[error("write to '{adapter}' failed: {source}")]
    Write {
        adapter: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// Attribute encoding failed; the partial line was still written
    #[error("Serialization error ({format_type}): {message}")]
    Serialization {
        format_type: String,
        message: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    /// An adapter panicked while handling a call
    #[error("Adapter '{adapter}' panicked: {message}")]
    AdapterPanic { adapter: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for LoggerError {
    fn from(err: std::io::Error) -> Self {
        LoggerError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for LoggerError {
    fn from(err: serde_json::Error) -> Self {
        LoggerError::Json(Arc::new(err))
    }
}

impl LoggerError {
    /// Create a write error attributed to a named adapter
    pub fn write(adapter: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::Write {
            adapter: adapter.into(),
            source: Arc::new(source),
        }
    }

    /// Create a serialization error
    pub fn serialization(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Serialization {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create an adapter panic error from a caught panic payload
    pub fn adapter_panic(adapter: impl Into<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        LoggerError::AdapterPanic {
            adapter: adapter.into(),
            message,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this is the disposed sentinel
    #[inline]
    pub fn is_disposed(&self) -> bool {
        matches!(self, LoggerError::Disposed)
    }
}

/// Keeps the first error of a fan-out while letting the remaining calls run.
#[derive(Debug, Default)]
pub(crate) struct FirstError(Option<LoggerError>);

impl FirstError {
    pub(crate) fn record(&mut self, result: Result<()>) {
        if let Err(e) = result {
            if self.0.is_none() {
                self.0 = Some(e);
            }
        }
    }

    pub(crate) fn into_result(self) -> Result<()> {
        match self.0 {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
