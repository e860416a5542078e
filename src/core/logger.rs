//! Application-facing logger
//!
//! [`Logger`] wraps a [`Handler`] and adds per-level convenience methods.
//! The handler is published through a swappable reference: every call takes
//! a cheap snapshot, so [`Logger::set_level`] never waits on a slow adapter
//! and in-flight calls finish against the handler they started with.

use super::adapter::Adapter;
use super::error::{LoggerError, Result};
use super::handler::Handler;
use super::level::Level;
use super::record::{Attr, Record, Source};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Generates a plain and an `_attrs` method for each level
macro_rules! level_methods {
    ($($level:ident => $plain:ident, $with_attrs:ident;)+) => {
        $(
            #[inline]
            pub fn $plain(&self, message: impl AsRef<str>) {
                self.log(Level::$level, message)
            }

            #[inline]
            pub fn $with_attrs(&self, message: impl AsRef<str>, attrs: Vec<Attr>) {
                self.log_attrs(Level::$level, message, attrs)
            }
        )+
    };
}

pub struct Logger {
    handler: RwLock<Arc<Handler>>,
}

impl Logger {
    /// A logger that accepts and drops everything
    #[must_use]
    pub fn new() -> Self {
        Self::from_handler(Handler::discard())
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    #[must_use]
    pub fn from_handler(handler: Handler) -> Self {
        Self {
            handler: RwLock::new(Arc::new(handler)),
        }
    }

    /// Snapshot of the current handler
    pub fn handler(&self) -> Arc<Handler> {
        Arc::clone(&self.handler.read())
    }

    pub fn level(&self) -> Level {
        self.handler.read().level()
    }

    /// Change the minimum level for this logger.
    ///
    /// Loggers already derived through `with_attrs`/`with_group` keep the
    /// level they were derived with.
    pub fn set_level(&self, level: Level) {
        let mut slot = self.handler.write();
        *slot = Arc::new(slot.with_level(level));
    }

    /// True if a record at `level` would reach at least one adapter
    pub fn enabled(&self, level: Level) -> bool {
        self.handler().enabled(level)
    }

    /// Log `message` at `level`, reporting adapter failures on stderr
    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        self.log_attrs(level, message, Vec::new())
    }

    pub fn log_attrs(&self, level: Level, message: impl AsRef<str>, attrs: Vec<Attr>) {
        let handler = self.handler();
        if !level.passes(handler.level()) {
            return;
        }
        let record = Record::new(level, message).with_attrs(attrs);
        report(handler.handle(&record));
    }

    /// Log with an explicit call site; used by the crate macros
    pub fn log_at(&self, level: Level, message: impl AsRef<str>, attrs: Vec<Attr>, source: Source) {
        let handler = self.handler();
        if !level.passes(handler.level()) {
            return;
        }
        let record = Record::new(level, message)
            .with_attrs(attrs)
            .with_source(source);
        report(handler.handle(&record));
    }

    /// Like [`log_attrs`](Self::log_attrs) but returns the handler's error,
    /// including [`LoggerError::Disposed`]
    pub fn try_log(&self, level: Level, message: impl AsRef<str>, attrs: Vec<Attr>) -> Result<()> {
        let handler = self.handler();
        if !level.passes(handler.level()) {
            return Ok(());
        }
        handler.handle(&Record::new(level, message).with_attrs(attrs))
    }

    /// Send a prebuilt record, returning the handler's error
    pub fn log_record(&self, record: &Record) -> Result<()> {
        let handler = self.handler();
        if !record.level.passes(handler.level()) {
            return Ok(());
        }
        handler.handle(record)
    }

    level_methods! {
        TRACE => trace, trace_attrs;
        VERBOSE => verbose, verbose_attrs;
        DEBUG => debug, debug_attrs;
        INFO => info, info_attrs;
        SUCCESS => success, success_attrs;
        NOTICE => notice, notice_attrs;
        DEPRECATED => deprecated, deprecated_attrs;
        WARN => warn, warn_attrs;
        ERROR => error, error_attrs;
        BUG => bug, bug_attrs;
        FATAL => fatal, fatal_attrs;
        ALWAYS => always, always_attrs;
    }

    /// Derive a logger whose records also carry `attrs`
    #[must_use]
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Logger {
        Self::from_handler(self.handler().with_attrs(attrs))
    }

    /// Derive a logger that nests later attributes under `name`
    #[must_use]
    pub fn with_group(&self, name: &str) -> Logger {
        Self::from_handler(self.handler().with_group(name))
    }

    pub fn flush(&self) -> Result<()> {
        self.handler().flush()
    }

    /// Dispose the adapters shared by this logger and everything derived
    /// from the same root. Safe to call repeatedly.
    pub fn dispose(&self) -> Result<()> {
        self.handler().dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.handler().is_disposed()
    }
}

fn report(result: Result<()>) {
    match result {
        Ok(()) | Err(LoggerError::Disposed) => {}
        Err(e) => eprintln!("[LOGGER ERROR] Failed to deliver log record: {}", e),
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("handler", &*self.handler.read())
            .finish()
    }
}

/// Builder for [`Logger`]
///
/// # Example
///
/// ```
/// use rust_log_pipeline::prelude::*;
///
/// let logger = Logger::builder()
///     .level(Level::DEBUG)
///     .adapter(DiscardAdapter)
///     .attrs(vec![Attr::new("service", "billing")])
///     .group("request")
///     .build();
///
/// logger.debug_attrs("charged", vec![Attr::new("amount", 1250)]);
/// assert_eq!(logger.level(), Level::DEBUG);
/// ```
#[derive(Default)]
pub struct LoggerBuilder {
    level: Level,
    adapters: Vec<Arc<dyn Adapter>>,
    attrs: Vec<Attr>,
    group: Option<String>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn adapter<A: Adapter + 'static>(mut self, adapter: A) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Attach an adapter that is also held elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Attach `adapter` if present; `None` is ignored
    #[must_use = "builder methods return a new value"]
    pub fn maybe_adapter<A: Adapter + 'static>(self, adapter: Option<A>) -> Self {
        match adapter {
            Some(adapter) => self.adapter(adapter),
            None => self,
        }
    }

    /// Attributes carried by every record. Applied before `group`.
    #[must_use = "builder methods return a new value"]
    pub fn attrs(mut self, attrs: Vec<Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.group = Some(name.into());
        self
    }

    pub fn build(self) -> Logger {
        let mut handler = Handler::new(self.adapters, self.level).with_attrs(self.attrs);
        if let Some(group) = self.group {
            handler = handler.with_group(&group);
        }
        Logger::from_handler(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapter::DiscardAdapter;
    use crate::core::buffered::BufferedAdapter;
    use crate::core::record::Value;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Default)]
    struct Spy {
        records: Mutex<Vec<Record>>,
        batches: AtomicUsize,
        fail: bool,
    }

    impl Spy {
        fn messages(&self) -> Vec<String> {
            self.records.lock().iter().map(|r| r.message.clone()).collect()
        }
    }

    impl Adapter for Spy {
        fn enabled(&self, _level: Level) -> bool {
            true
        }

        fn handle(&self, record: &Record) -> Result<()> {
            if self.fail {
                return Err(LoggerError::other("spy failure"));
            }
            self.records.lock().push(record.clone());
            Ok(())
        }

        fn batch_handle(&self, records: &[Record]) -> Result<()> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.records.lock().extend_from_slice(records);
            Ok(())
        }

        fn name(&self) -> &str {
            "spy"
        }
    }

    fn spy_logger(level: Level) -> (Arc<Spy>, Logger) {
        let spy = Arc::new(Spy::default());
        let logger = Logger::builder()
            .level(level)
            .shared_adapter(spy.clone())
            .build();
        (spy, logger)
    }

    #[test]
    fn test_default_logger_is_usable() {
        let logger = Logger::new();
        logger.info("nobody hears this");
        logger.always("or this");
        assert!(!logger.enabled(Level::ALWAYS));
        assert!(logger.flush().is_ok());
        assert!(logger.dispose().is_ok());
    }

    #[test]
    fn test_missing_adapter_falls_back_to_discard() {
        let logger = Logger::builder()
            .maybe_adapter(None::<DiscardAdapter>)
            .build();
        assert_eq!(logger.handler().adapter_names(), vec!["discard"]);
        assert!(logger.try_log(Level::ERROR, "x", Vec::new()).is_ok());
    }

    #[test]
    fn test_level_methods_and_gate() {
        let (spy, logger) = spy_logger(Level::INFO);
        logger.trace("t");
        logger.verbose("v");
        logger.debug("d");
        logger.info("i");
        logger.success("s");
        logger.notice("n");
        logger.deprecated("dep");
        logger.warn("w");
        logger.error("e");
        logger.bug("b");
        logger.fatal("f");
        logger.always("a");

        assert_eq!(
            spy.messages(),
            vec!["i", "s", "n", "dep", "w", "e", "b", "f", "a"]
        );
        let levels: Vec<Level> = spy.records.lock().iter().map(|r| r.level).collect();
        assert_eq!(levels[0], Level::INFO);
        assert_eq!(levels[8], Level::ALWAYS);
    }

    #[test]
    fn test_set_level() {
        let (spy, logger) = spy_logger(Level::WARN);
        logger.info("hidden");
        logger.set_level(Level::DEBUG);
        assert_eq!(logger.level(), Level::DEBUG);
        logger.debug("shown");

        logger.set_level(Level::QUIET);
        logger.always("silenced");
        assert_eq!(spy.messages(), vec!["shown"]);
    }

    #[test]
    fn test_log_record_respects_level() {
        let (spy, logger) = spy_logger(Level::INFO);
        logger.log_record(&Record::new(Level::DEBUG, "too quiet")).unwrap();
        logger.log_record(&Record::new(Level::WARN, "prebuilt")).unwrap();

        logger.set_level(Level::QUIET);
        logger.log_record(&Record::new(Level::ALWAYS, "silenced")).unwrap();
        assert_eq!(spy.messages(), vec!["prebuilt"]);
    }

    #[test]
    fn test_attrs_and_groups() {
        let (spy, logger) = spy_logger(Level::INFO);
        let request = logger
            .with_attrs(vec![Attr::new("service", "api")])
            .with_group("http");
        request.info_attrs("served", vec![Attr::new("status", 200)]);

        let records = spy.records.lock();
        let keys: Vec<&str> = records[0].attrs.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["service", "http.status"]);
        assert_eq!(records[0].attrs[1].value, Value::Int(200));
    }

    #[test]
    fn test_builder_attrs_then_group() {
        let spy = Arc::new(Spy::default());
        let logger = Logger::builder()
            .shared_adapter(spy.clone())
            .attrs(vec![Attr::new("app", "demo")])
            .group("job")
            .build();
        logger.info_attrs("ran", vec![Attr::new("id", 7)]);

        let keys: Vec<String> = spy.records.lock()[0]
            .attrs
            .iter()
            .map(|a| a.key.clone())
            .collect();
        assert_eq!(keys, vec!["app", "job.id"]);
    }

    #[test]
    fn test_logging_after_dispose_is_silent() {
        let (spy, logger) = spy_logger(Level::INFO);
        logger.info("before");
        logger.dispose().unwrap();
        logger.info("after");

        assert!(logger.is_disposed());
        assert!(logger.try_log(Level::INFO, "after", Vec::new()).unwrap_err().is_disposed());
        assert!(logger.flush().unwrap_err().is_disposed());
        assert_eq!(spy.messages(), vec!["before"]);
    }

    #[test]
    fn test_try_log_surfaces_adapter_errors() {
        let spy = Spy {
            fail: true,
            ..Default::default()
        };
        let logger = Logger::builder().adapter(spy).build();
        let err = logger.try_log(Level::INFO, "x", Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "spy failure");
        // the convenience path only reports
        logger.info("x");
    }

    #[test]
    fn test_buffered_capacity_scenario() {
        let spy = Arc::new(Spy::default());
        let buffered = Arc::new(BufferedAdapter::new(spy.clone(), 2));
        let logger = Logger::builder().shared_adapter(buffered.clone()).build();

        logger.info("A");
        logger.info("B");
        logger.info("C");
        logger.flush().unwrap();

        assert_eq!(spy.batches.load(Ordering::SeqCst), 1);
        assert_eq!(spy.messages(), vec!["A", "B"]);
        assert_eq!(buffered.dropped(), 1);
    }

    #[test]
    fn test_set_level_races_with_logging() {
        let (spy, logger) = spy_logger(Level::INFO);
        let logger = Arc::new(logger);

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for _ in 0..500 {
                        logger.error("e");
                    }
                })
            })
            .collect();
        for i in 0..100 {
            logger.set_level(if i % 2 == 0 { Level::DEBUG } else { Level::WARN });
        }
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(spy.records.lock().len(), 2000);
    }
}
