//! Batching decorator with bounded backpressure
//!
//! [`BufferedAdapter`] wraps any [`Adapter`] and queues records instead of
//! writing them. A flush moves the whole queue to the wrapped adapter's
//! `batch_handle` in one call. When the queue is at capacity new records are
//! dropped and counted; producers never block on the wrapped adapter.
//!
//! Flushes happen on an explicit [`flush`](Adapter::flush) or, when
//! configured, on a dedicated background thread woken by a timer and/or by
//! the queue reaching a count threshold. At most one flush runs at a time.
//!
//! # Example
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let buffered = BufferedAdapter::builder(DiscardAdapter)
//!     .capacity(4096)
//!     .flush_interval(Duration::from_millis(250))
//!     .build()?;
//!
//! let logger = Logger::builder().adapter(buffered).build();
//! logger.info("queued");
//! logger.dispose()?;
//! # Ok(())
//! # }
//! ```

use super::adapter::Adapter;
use super::error::{FirstError, LoggerError, Result};
use super::level::Level;
use super::metrics::LoggerMetrics;
use super::record::Record;
use crossbeam_channel::{bounded, never, select, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default number of records a buffer holds before dropping
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Called when records are dropped; receives the adapter's total drop count
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

struct Shared<A> {
    adapter: A,
    name: String,
    capacity: usize,
    flush_threshold: Option<usize>,
    pending: Mutex<Vec<Record>>,
    /// Held for the duration of a flush; doubles as the spare buffer that is
    /// swapped with `pending`
    flushing: Mutex<Vec<Record>>,
    /// Only written while `pending` is locked
    disposed: AtomicBool,
    metrics: LoggerMetrics,
    on_overflow: Option<OverflowCallback>,
    wake: Option<Sender<()>>,
}

impl<A: Adapter> Shared<A> {
    fn overflowed(&self, count: u64) {
        let previous = self.metrics.record_dropped_many(count);
        LoggerMetrics::global().record_dropped_many(count);
        let total = previous + count;

        // Alert on the first drop and on every thousandth thereafter
        if previous == 0 || total / 1000 > previous / 1000 {
            eprintln!(
                "[LOGGER WARNING] Buffer '{}' full, {} records dropped. \
                 Consider increasing capacity or flushing more often.",
                self.name, total
            );
            if let Some(ref callback) = self.on_overflow {
                callback(total);
            }
        }
    }

    fn wake_flusher(&self) {
        if let Some(ref wake) = self.wake {
            // A full channel means a wake-up is already pending
            let _ = wake.try_send(());
        }
    }

    /// Drain the queue into the wrapped adapter. Caller holds `flushing`.
    fn flush_locked(&self, spare: &mut Vec<Record>) -> Result<()> {
        {
            let mut pending = self.pending.lock();
            std::mem::swap(&mut *pending, spare);
        }

        let mut first = FirstError::default();
        if !spare.is_empty() {
            let count = spare.len() as u64;
            let result = self.adapter.batch_handle(spare);
            self.metrics.record_delivered(count);
            LoggerMetrics::global().record_delivered(count);
            self.metrics.record_flush(result.is_err());
            spare.clear();
            first.record(result);
        }
        first.record(self.adapter.flush());
        first.into_result()
    }

    fn background_flush(&self) {
        let mut spare = self.flushing.lock();
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.flush_locked(&mut spare) {
            eprintln!("[LOGGER ERROR] Background flush of '{}' failed: {}", self.name, e);
        }
    }
}

struct Flusher {
    stop: Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl Flusher {
    fn spawn<A: Adapter + 'static>(
        shared: Arc<Shared<A>>,
        interval: Option<Duration>,
        wake: Receiver<()>,
    ) -> Result<Self> {
        let (stop, stopped) = bounded::<()>(1);
        let ticker = interval.map(tick).unwrap_or_else(never);
        let thread_name = format!("{}-flusher", shared.name);

        let handle = thread::Builder::new().name(thread_name).spawn(move || loop {
            select! {
                recv(stopped) -> _ => break,
                recv(wake) -> msg => {
                    if msg.is_err() {
                        break;
                    }
                    shared.background_flush();
                }
                recv(ticker) -> _ => shared.background_flush(),
            }
        })?;

        Ok(Self { stop, handle })
    }

    /// Signal the thread and wait for it, letting an in-flight flush finish
    fn stop(self) {
        drop(self.stop);
        if let Err(e) = self.handle.join() {
            eprintln!("[LOGGER ERROR] Buffer flusher thread panicked during shutdown: {:?}", e);
        }
    }
}

/// Decorator that queues records for `A` and delivers them in batches
pub struct BufferedAdapter<A: Adapter + 'static> {
    shared: Arc<Shared<A>>,
    flusher: Mutex<Option<Flusher>>,
    dispose_result: Mutex<Option<Result<()>>>,
}

impl<A: Adapter + 'static> BufferedAdapter<A> {
    /// Buffer `adapter` with an explicit-flush-only policy.
    ///
    /// A capacity of zero drops every record.
    pub fn new(adapter: A, capacity: usize) -> Self {
        Self::from_parts(adapter, capacity, None, None, None)
    }

    pub fn builder(adapter: A) -> BufferedAdapterBuilder<A> {
        BufferedAdapterBuilder::new(adapter)
    }

    fn from_parts(
        adapter: A,
        capacity: usize,
        flush_threshold: Option<usize>,
        on_overflow: Option<OverflowCallback>,
        wake: Option<Sender<()>>,
    ) -> Self {
        let name = format!("buffered({})", adapter.name());
        Self {
            shared: Arc::new(Shared {
                adapter,
                name,
                capacity,
                flush_threshold,
                pending: Mutex::new(Vec::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY))),
                flushing: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
                metrics: LoggerMetrics::new(),
                on_overflow,
                wake,
            }),
            flusher: Mutex::new(None),
            dispose_result: Mutex::new(None),
        }
    }

    /// The wrapped adapter
    pub fn inner(&self) -> &A {
        &self.shared.adapter
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Records dropped by this buffer so far
    pub fn dropped(&self) -> u64 {
        self.shared.metrics.dropped_count()
    }

    /// Records handed to the wrapped adapter so far
    pub fn delivered(&self) -> u64 {
        self.shared.metrics.delivered_count()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    pub fn has_flusher(&self) -> bool {
        self.flusher.lock().is_some()
    }

    fn enqueue<'r, I>(&self, records: I, count: usize) -> Result<()>
    where
        I: Iterator<Item = &'r Record>,
    {
        let shared = &self.shared;
        let mut pending = shared.pending.lock();
        if shared.disposed.load(Ordering::Acquire) {
            return Err(LoggerError::Disposed);
        }

        let room = shared.capacity.saturating_sub(pending.len());
        let accepted = count.min(room);
        pending.extend(records.take(accepted).cloned());
        let wake = shared
            .flush_threshold
            .is_some_and(|threshold| pending.len() >= threshold);
        drop(pending);

        if accepted < count {
            shared.overflowed((count - accepted) as u64);
        }
        if wake {
            shared.wake_flusher();
        }
        Ok(())
    }
}

impl<A: Adapter + 'static> Adapter for BufferedAdapter<A> {
    fn enabled(&self, level: Level) -> bool {
        self.shared.adapter.enabled(level)
    }

    /// Queue one record, or drop and count it when the buffer is full
    fn handle(&self, record: &Record) -> Result<()> {
        self.enqueue(std::iter::once(record), 1)
    }

    fn batch_handle(&self, records: &[Record]) -> Result<()> {
        self.enqueue(records.iter(), records.len())
    }

    /// Deliver everything queued so far; returns once the wrapped adapter's
    /// batch call has completed
    fn flush(&self) -> Result<()> {
        let mut spare = self.shared.flushing.lock();
        if self.shared.disposed.load(Ordering::Acquire) {
            return Err(LoggerError::Disposed);
        }
        self.shared.flush_locked(&mut spare)
    }

    /// Stop the flusher, deliver what is left, then dispose the wrapped
    /// adapter even if that last delivery failed
    fn dispose(&self) -> Result<()> {
        let mut cached = self.dispose_result.lock();
        if let Some(result) = cached.as_ref() {
            return result.clone();
        }

        {
            let _pending = self.shared.pending.lock();
            self.shared.disposed.store(true, Ordering::Release);
        }

        if let Some(flusher) = self.flusher.lock().take() {
            flusher.stop();
        }

        let mut first = FirstError::default();
        {
            let mut spare = self.shared.flushing.lock();
            first.record(self.shared.flush_locked(&mut spare));
            first.record(self.shared.adapter.dispose());
        }

        let result = first.into_result();
        *cached = Some(result.clone());
        result
    }

    fn name(&self) -> &str {
        &self.shared.name
    }
}

impl<A: Adapter + 'static> Drop for BufferedAdapter<A> {
    fn drop(&mut self) {
        if self.dispose_result.get_mut().is_none() {
            if let Err(e) = self.dispose() {
                eprintln!("[LOGGER ERROR] Failed to dispose '{}' on drop: {}", self.shared.name, e);
            }
        }

        let dropped = self.shared.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] '{}' shutting down with {} dropped records (drop rate: {:.2}%)",
                self.shared.name,
                dropped,
                self.shared.metrics.drop_rate()
            );
        }
    }
}

/// Builder for [`BufferedAdapter`]
///
/// # Example
///
/// ```
/// use rust_log_pipeline::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let buffered = BufferedAdapter::builder(DiscardAdapter)
///     .capacity(100)
///     .flush_threshold(50)
///     .flush_interval(Duration::from_secs(1))
///     .on_overflow(Arc::new(|total| eprintln!("ALERT: {} records dropped", total)))
///     .build()
///     .unwrap();
/// assert!(buffered.has_flusher());
/// ```
pub struct BufferedAdapterBuilder<A> {
    adapter: A,
    capacity: usize,
    flush_threshold: Option<usize>,
    flush_interval: Option<Duration>,
    on_overflow: Option<OverflowCallback>,
}

impl<A: Adapter + 'static> BufferedAdapterBuilder<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            capacity: DEFAULT_BUFFER_CAPACITY,
            flush_threshold: None,
            flush_interval: None,
            on_overflow: None,
        }
    }

    /// Maximum number of queued records
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Wake the background flusher once this many records are queued
    #[must_use = "builder methods return a new value"]
    pub fn flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = Some(threshold);
        self
    }

    /// Flush on a fixed period from the background flusher
    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Build the adapter, starting the background flusher if a threshold or
    /// interval was configured
    pub fn build(self) -> Result<BufferedAdapter<A>> {
        if self.flush_threshold == Some(0) {
            return Err(LoggerError::config(
                "BufferedAdapter",
                "flush threshold must be non-zero",
            ));
        }
        if self.flush_interval == Some(Duration::ZERO) {
            return Err(LoggerError::config(
                "BufferedAdapter",
                "flush interval must be non-zero",
            ));
        }

        let background = self.flush_threshold.is_some() || self.flush_interval.is_some();
        let (wake_tx, wake_rx) = if background {
            let (tx, rx) = bounded(1);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let adapter = BufferedAdapter::from_parts(
            self.adapter,
            self.capacity,
            self.flush_threshold,
            self.on_overflow,
            wake_tx,
        );

        if let Some(wake_rx) = wake_rx {
            let flusher = Flusher::spawn(Arc::clone(&adapter.shared), self.flush_interval, wake_rx)?;
            *adapter.flusher.lock() = Some(flusher);
        }

        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize};
    use std::time::Instant;

    #[derive(Default)]
    struct BatchSpy {
        batches: Mutex<Vec<Vec<String>>>,
        flushes: AtomicUsize,
        disposes: AtomicUsize,
        delay: Option<Duration>,
        gate: Option<(Sender<()>, Receiver<()>)>,
    }

    impl BatchSpy {
        fn delivered(&self) -> Vec<String> {
            self.batches.lock().iter().flatten().cloned().collect()
        }
    }

    impl Adapter for BatchSpy {
        fn enabled(&self, _level: Level) -> bool {
            true
        }

        fn handle(&self, record: &Record) -> Result<()> {
            self.batch_handle(std::slice::from_ref(record))
        }

        fn batch_handle(&self, records: &[Record]) -> Result<()> {
            if let Some((started, release)) = &self.gate {
                let _ = started.send(());
                let _ = release.recv();
            }
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            self.batches
                .lock()
                .push(records.iter().map(|r| r.message.clone()).collect());
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn dispose(&self) -> Result<()> {
            self.disposes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "batch-spy"
        }
    }

    fn rec(msg: &str) -> Record {
        Record::new(Level::INFO, msg)
    }

    fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        check()
    }

    #[test]
    fn test_overflow_drops_newest() {
        let buffered = BufferedAdapter::new(BatchSpy::default(), 2);
        buffered.handle(&rec("A")).unwrap();
        buffered.handle(&rec("B")).unwrap();
        buffered.handle(&rec("C")).unwrap();

        assert_eq!(buffered.pending(), 2);
        assert_eq!(buffered.dropped(), 1);

        buffered.flush().unwrap();
        assert_eq!(*buffered.inner().batches.lock(), vec![vec!["A", "B"]]);
        assert_eq!(buffered.delivered(), 2);
        assert_eq!(buffered.pending(), 0);
    }

    #[test]
    fn test_batch_handle_drops_per_record() {
        let buffered = BufferedAdapter::new(BatchSpy::default(), 3);
        buffered.handle(&rec("first")).unwrap();
        buffered
            .batch_handle(&[rec("a"), rec("b"), rec("c"), rec("d")])
            .unwrap();

        assert_eq!(buffered.dropped(), 2);
        buffered.flush().unwrap();
        assert_eq!(buffered.inner().delivered(), vec!["first", "a", "b"]);
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let buffered = BufferedAdapter::new(BatchSpy::default(), 0);
        buffered.handle(&rec("x")).unwrap();
        buffered.flush().unwrap();
        assert_eq!(buffered.dropped(), 1);
        assert!(buffered.inner().batches.lock().is_empty());
    }

    #[test]
    fn test_flush_waits_for_batch_write() {
        let spy = BatchSpy {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let buffered = BufferedAdapter::new(spy, 8);
        buffered.handle(&rec("slow")).unwrap();

        buffered.flush().unwrap();
        assert_eq!(buffered.inner().delivered(), vec!["slow"]);
        assert_eq!(buffered.inner().flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_records_during_flush_go_to_next_batch() {
        let (started_tx, started_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let spy = BatchSpy {
            gate: Some((started_tx, release_rx)),
            ..Default::default()
        };
        let buffered = Arc::new(BufferedAdapter::new(spy, 8));
        buffered.handle(&rec("first")).unwrap();

        let flushing = {
            let buffered = Arc::clone(&buffered);
            thread::spawn(move || buffered.flush())
        };

        started_rx.recv().unwrap();
        buffered.handle(&rec("during")).unwrap();
        assert_eq!(buffered.pending(), 1);
        release_tx.send(()).unwrap();
        flushing.join().unwrap().unwrap();

        let flushing = {
            let buffered = Arc::clone(&buffered);
            thread::spawn(move || buffered.flush())
        };
        started_rx.recv().unwrap();
        release_tx.send(()).unwrap();
        flushing.join().unwrap().unwrap();

        assert_eq!(
            *buffered.inner().batches.lock(),
            vec![vec!["first"], vec!["during"]]
        );
    }

    #[test]
    fn test_interval_flush() {
        let buffered = BufferedAdapter::builder(BatchSpy::default())
            .capacity(16)
            .flush_interval(Duration::from_millis(10))
            .build()
            .unwrap();
        buffered.handle(&rec("tick")).unwrap();

        assert!(wait_until(Duration::from_secs(2), || {
            buffered.inner().delivered() == vec!["tick"]
        }));
    }

    #[test]
    fn test_threshold_wakes_flusher() {
        let buffered = BufferedAdapter::builder(BatchSpy::default())
            .capacity(16)
            .flush_threshold(3)
            .build()
            .unwrap();
        buffered.handle(&rec("1")).unwrap();
        buffered.handle(&rec("2")).unwrap();
        assert_eq!(buffered.pending(), 2);
        buffered.handle(&rec("3")).unwrap();

        assert!(wait_until(Duration::from_secs(2), || buffered.delivered() == 3));
    }

    #[test]
    fn test_builder_rejects_zero_policies() {
        assert!(BufferedAdapter::builder(BatchSpy::default())
            .flush_threshold(0)
            .build()
            .is_err());
        assert!(BufferedAdapter::builder(BatchSpy::default())
            .flush_interval(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_dispose_flushes_then_disposes_inner() {
        let buffered = BufferedAdapter::builder(BatchSpy::default())
            .capacity(8)
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();
        buffered.handle(&rec("last words")).unwrap();

        buffered.dispose().unwrap();
        assert!(!buffered.has_flusher());
        assert_eq!(buffered.inner().delivered(), vec!["last words"]);
        assert_eq!(buffered.inner().disposes.load(Ordering::SeqCst), 1);

        // idempotent, and terminal
        buffered.dispose().unwrap();
        assert_eq!(buffered.inner().disposes.load(Ordering::SeqCst), 1);
        assert!(buffered.handle(&rec("late")).unwrap_err().is_disposed());
        assert!(buffered.flush().unwrap_err().is_disposed());
    }

    #[test]
    fn test_drop_disposes() {
        let spy = Arc::new(BatchSpy::default());
        {
            let buffered = BufferedAdapter::new(Arc::clone(&spy), 4);
            buffered.handle(&rec("pending")).unwrap();
        }
        assert_eq!(spy.delivered(), vec!["pending"]);
        assert_eq!(spy.disposes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_overflow_callback_and_global_counter() {
        let alerts = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&alerts);
        let buffered = BufferedAdapter::builder(BatchSpy::default())
            .capacity(1)
            .on_overflow(Arc::new(move |total| {
                seen.store(total, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        let global_before = LoggerMetrics::global().dropped_count();
        buffered.handle(&rec("kept")).unwrap();
        buffered.handle(&rec("lost")).unwrap();

        assert_eq!(alerts.load(Ordering::SeqCst), 1);
        assert!(LoggerMetrics::global().dropped_count() > global_before);
    }
}
