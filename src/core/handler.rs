//! Level-gated fan-out to adapters, with scope derivation and disposal
//!
//! A [`Handler`] is a cheap value: the adapter set and lifecycle state live in
//! a shared core, while the minimum level and the inherited attribute/group
//! scope belong to each handler value. Derivation (`with_attrs`,
//! `with_group`, `with_level`) builds a new value around the same core and
//! never touches the receiver.
//!
//! The core is either *Active* (holding the adapters) or *Disposed*
//! (terminal). Fan-out holds the state's read lock for its whole duration and
//! disposal takes the write lock, so a caller sees either the full adapter
//! set or the disposed state, and once `dispose` returns no adapter is
//! reached again.

use super::adapter::{Adapter, DiscardAdapter};
use super::error::{FirstError, LoggerError, Result};
use super::level::Level;
use super::record::{Attr, Record};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

enum State {
    Active(Vec<Arc<dyn Adapter>>),
    /// Holds the outcome of the one real disposal so later calls can replay it
    Disposed(Result<()>),
}

struct HandlerCore {
    state: RwLock<State>,
}

impl HandlerCore {
    fn dispose(&self) -> Result<()> {
        let mut state = self.state.write();
        let adapters = match &mut *state {
            State::Disposed(result) => return result.clone(),
            State::Active(adapters) => std::mem::take(adapters),
        };

        let result = dispose_all(&adapters);
        *state = State::Disposed(result.clone());
        result
    }
}

impl Drop for HandlerCore {
    fn drop(&mut self) {
        if let State::Active(adapters) = self.state.get_mut() {
            let adapters = std::mem::take(adapters);
            if let Err(e) = dispose_all(&adapters) {
                eprintln!("[LOGGER ERROR] Failed to dispose adapters on drop: {}", e);
            }
        }
    }
}

fn dispose_all(adapters: &[Arc<dyn Adapter>]) -> Result<()> {
    let mut first = FirstError::default();
    for adapter in adapters {
        first.record(isolated(adapter.as_ref(), "dispose", || adapter.dispose()));
    }
    first.into_result()
}

/// Run one adapter call, turning a panic into an error so the remaining
/// adapters still get their turn.
fn isolated<F>(adapter: &dyn Adapter, operation: &str, call: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let err = LoggerError::adapter_panic(adapter.name(), &*payload);
            eprintln!(
                "[LOGGER CRITICAL] Adapter '{}' panicked during {}: {}. \
                 Other adapters continue to function.",
                adapter.name(),
                operation,
                err
            );
            Err(err)
        }
    }
}

/// Attributes and group prefix inherited through derivation
#[derive(Debug, Default)]
struct Scope {
    prefix: Option<String>,
    attrs: Vec<Attr>,
}

impl Scope {
    fn is_empty(&self) -> bool {
        self.prefix.is_none() && self.attrs.is_empty()
    }

    fn prefixed(&self, attr: &Attr) -> Attr {
        match &self.prefix {
            Some(prefix) => attr.prefixed(prefix),
            None => attr.clone(),
        }
    }

    /// Inherited attributes first, then the record's own under the prefix
    fn apply<'a>(&self, record: &'a Record) -> Cow<'a, Record> {
        if self.is_empty() {
            return Cow::Borrowed(record);
        }

        let mut attrs = Vec::with_capacity(self.attrs.len() + record.attrs.len());
        attrs.extend(self.attrs.iter().cloned());
        attrs.extend(record.attrs.iter().map(|attr| self.prefixed(attr)));

        Cow::Owned(Record {
            time: record.time,
            level: record.level,
            message: record.message.clone(),
            source: record.source.clone(),
            attrs,
        })
    }
}

#[derive(Clone)]
pub struct Handler {
    core: Arc<HandlerCore>,
    level: Level,
    scope: Arc<Scope>,
}

impl Handler {
    /// Create an active handler over `adapters`.
    ///
    /// With no adapters the handler falls back to the shared discard adapter.
    pub fn new<I>(adapters: I, level: Level) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Adapter>>,
    {
        let mut adapters: Vec<Arc<dyn Adapter>> = adapters.into_iter().collect();
        if adapters.is_empty() {
            adapters.push(DiscardAdapter::shared());
        }

        Self {
            core: Arc::new(HandlerCore {
                state: RwLock::new(State::Active(adapters)),
            }),
            level,
            scope: Arc::new(Scope::default()),
        }
    }

    /// An active handler that drops everything
    pub fn discard() -> Self {
        Self::new(std::iter::empty(), Level::QUIET)
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Group prefix inherited through `with_group`, dot-joined
    pub fn group_prefix(&self) -> Option<&str> {
        self.scope.prefix.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        matches!(*self.core.state.read(), State::Disposed(_))
    }

    /// Names of the attached adapters; empty once disposed
    pub fn adapter_names(&self) -> Vec<String> {
        match &*self.core.state.read() {
            State::Active(adapters) => adapters.iter().map(|a| a.name().to_string()).collect(),
            State::Disposed(_) => Vec::new(),
        }
    }

    /// True while active, when `level` passes this handler's minimum and at
    /// least one adapter would emit it
    pub fn enabled(&self, level: Level) -> bool {
        if !level.passes(self.level) {
            return false;
        }
        match &*self.core.state.read() {
            State::Active(adapters) => adapters.iter().any(|a| a.enabled(level)),
            State::Disposed(_) => false,
        }
    }

    /// Fan `record` out to every adapter enabled for its level.
    ///
    /// All enabled adapters are attempted; the first error is returned.
    pub fn handle(&self, record: &Record) -> Result<()> {
        let state = self.core.state.read();
        let adapters = match &*state {
            State::Active(adapters) => adapters,
            State::Disposed(_) => return Err(LoggerError::Disposed),
        };

        let record = self.scope.apply(record);
        let mut first = FirstError::default();
        for adapter in adapters.iter().filter(|a| a.enabled(record.level)) {
            first.record(isolated(adapter.as_ref(), "handle", || {
                adapter.handle(&record)
            }));
        }
        first.into_result()
    }

    /// Derive a handler whose records also carry `attrs`.
    ///
    /// Deriving from a disposed handler yields a discard handler.
    #[must_use]
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Handler {
        if self.is_disposed() {
            return Handler::discard();
        }
        if attrs.is_empty() {
            return self.clone();
        }

        let mut inherited = self.scope.attrs.clone();
        inherited.extend(attrs.iter().map(|attr| self.scope.prefixed(attr)));

        self.derive(Scope {
            prefix: self.scope.prefix.clone(),
            attrs: inherited,
        })
    }

    /// Derive a handler that nests later attributes under `name`.
    ///
    /// Deriving from a disposed handler yields a discard handler.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Handler {
        if self.is_disposed() {
            return Handler::discard();
        }
        if name.is_empty() {
            return self.clone();
        }

        let prefix = match &self.scope.prefix {
            Some(existing) => format!("{}.{}", existing, name),
            None => name.to_string(),
        };

        self.derive(Scope {
            prefix: Some(prefix),
            attrs: self.scope.attrs.clone(),
        })
    }

    /// Same adapters and scope, different minimum level
    #[must_use]
    pub fn with_level(&self, level: Level) -> Handler {
        Handler {
            core: Arc::clone(&self.core),
            level,
            scope: Arc::clone(&self.scope),
        }
    }

    fn derive(&self, scope: Scope) -> Handler {
        Handler {
            core: Arc::clone(&self.core),
            level: self.level,
            scope: Arc::new(scope),
        }
    }

    /// Flush every adapter, returning the first error
    pub fn flush(&self) -> Result<()> {
        let state = self.core.state.read();
        let adapters = match &*state {
            State::Active(adapters) => adapters,
            State::Disposed(_) => return Err(LoggerError::Disposed),
        };

        let mut first = FirstError::default();
        for adapter in adapters {
            first.record(isolated(adapter.as_ref(), "flush", || adapter.flush()));
        }
        first.into_result()
    }

    /// Dispose every adapter and enter the terminal state.
    ///
    /// Waits for in-flight `handle`/`flush` calls to finish first. Shared by
    /// all handlers derived from the same root; repeated calls return the
    /// result of the first one.
    ///
    /// Adapters are disposed while the state lock is held for writing, so a
    /// concurrent `handle` blocks until every adapter has finished, including
    /// the final batch write of a [`BufferedAdapter`]. This is the only case
    /// where `handle` waits on adapter I/O.
    ///
    /// [`BufferedAdapter`]: crate::core::buffered::BufferedAdapter
    pub fn dispose(&self) -> Result<()> {
        self.core.dispose()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("level", &self.level)
            .field("disposed", &self.is_disposed())
            .field("adapters", &self.adapter_names())
            .field("group", &self.scope.prefix)
            .field("attrs", &self.scope.attrs.len())
            .finish()
    }
}
