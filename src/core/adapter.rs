//! Adapter trait for log output destinations

use super::error::{FirstError, Result};
use super::level::Level;
use super::record::Record;
use std::sync::{Arc, OnceLock};

/// A pluggable sink that records are fanned out to
///
/// Adapters are shared across threads, so every method takes `&self`;
/// implementations guard their own writers.
pub trait Adapter: Send + Sync {
    /// Whether a record at `level` would be emitted
    fn enabled(&self, level: Level) -> bool;

    fn handle(&self, record: &Record) -> Result<()>;

    /// Handle several records at once, in order.
    ///
    /// The default forwards each record to `handle`, keeps going after a
    /// failure and returns the first error.
    fn batch_handle(&self, records: &[Record]) -> Result<()> {
        let mut first = FirstError::default();
        for record in records {
            first.record(self.handle(record));
        }
        first.into_result()
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources. Called once by the owning handler.
    fn dispose(&self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}

impl<A: Adapter + ?Sized> Adapter for Arc<A> {
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        (**self).handle(record)
    }

    fn batch_handle(&self, records: &[Record]) -> Result<()> {
        (**self).batch_handle(records)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn dispose(&self) -> Result<()> {
        (**self).dispose()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<A: Adapter + ?Sized> Adapter for Box<A> {
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        (**self).handle(record)
    }

    fn batch_handle(&self, records: &[Record]) -> Result<()> {
        (**self).batch_handle(records)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn dispose(&self) -> Result<()> {
        (**self).dispose()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Accepts and drops everything without error
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardAdapter;

static DISCARD: OnceLock<Arc<dyn Adapter>> = OnceLock::new();

impl DiscardAdapter {
    /// The shared instance used when a logger has no adapters
    pub fn shared() -> Arc<dyn Adapter> {
        Arc::clone(DISCARD.get_or_init(|| Arc::new(DiscardAdapter)))
    }
}

impl Adapter for DiscardAdapter {
    #[inline]
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    #[inline]
    fn handle(&self, _record: &Record) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn batch_handle(&self, _records: &[Record]) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "discard"
    }
}
