//! Delivery metrics for buffered adapters
//!
//! Every [`BufferedAdapter`](super::BufferedAdapter) owns a `LoggerMetrics`
//! and also feeds the process-wide instance returned by
//! [`LoggerMetrics::global`], which an observability exporter can poll.
//! Counters only ever grow; flushing or disposing never resets them.

use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_METRICS: LoggerMetrics = LoggerMetrics::new();

/// Counters for buffered delivery
///
/// # Example
///
/// ```
/// use rust_log_pipeline::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_delivered(3);
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.delivered_count(), 3);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records discarded because the buffer was at capacity
    dropped_count: AtomicU64,

    /// Records handed to the wrapped adapter's batch path
    delivered_count: AtomicU64,

    /// Completed flushes that carried at least one record
    flush_count: AtomicU64,

    /// Flushes whose batch write returned an error
    flush_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            dropped_count: AtomicU64::new(0),
            delivered_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
        }
    }

    /// Process-wide counters aggregated across all buffered adapters
    pub fn global() -> &'static LoggerMetrics {
        &GLOBAL_METRICS
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    /// Record a dropped record, returning the previous count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `n` dropped records at once, returning the previous count
    #[inline]
    pub fn record_dropped_many(&self, n: u64) -> u64 {
        self.dropped_count.fetch_add(n, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self, n: u64) -> u64 {
        self.delivered_count.fetch_add(n, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self, failed: bool) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.flush_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been delivered or dropped.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.delivered_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            dropped_count: AtomicU64::new(self.dropped_count()),
            delivered_count: AtomicU64::new(self.delivered_count()),
            flush_count: AtomicU64::new(self.flush_count()),
            flush_failures: AtomicU64::new(self.flush_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.delivered_count(), 0);
        assert_eq!(metrics.flush_count(), 0);
        assert_eq!(metrics.flush_failures(), 0);
    }

    #[test]
    fn test_metrics_record_dropped() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0); // Returns previous value
        assert_eq!(metrics.record_dropped_many(4), 1);
        assert_eq!(metrics.dropped_count(), 5);
    }

    #[test]
    fn test_metrics_flushes() {
        let metrics = LoggerMetrics::new();
        metrics.record_flush(false);
        metrics.record_flush(true);
        assert_eq!(metrics.flush_count(), 2);
        assert_eq!(metrics.flush_failures(), 1);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        metrics.record_delivered(90);
        metrics.record_dropped_many(10);

        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_global_is_monotonic() {
        let before = LoggerMetrics::global().dropped_count();
        LoggerMetrics::global().record_dropped();
        assert!(LoggerMetrics::global().dropped_count() > before);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_dropped();

        let snapshot = metrics.clone();
        metrics.record_dropped();
        assert_eq!(metrics.dropped_count(), 2);
        assert_eq!(snapshot.dropped_count(), 1);
    }
}
