//! Pooled attribute maps
//!
//! Adapters flatten a record's attribute tree into an [`AttrMap`] right
//! before serializing it. Maps come from an [`AttrMapPool`] and go back to it
//! through [`AttrMap::free`], so steady-state logging does not allocate a map
//! per record.
//!
//! Nested groups become nested maps drawn from the same pool. `free` walks
//! the tree and returns every nested map as well.
//!
//! # Example
//!
//! ```
//! use rust_log_pipeline::core::{AttrMap, Value};
//!
//! let mut map = AttrMap::acquire();
//! map.set("user", "alice").set("attempt", 3);
//! assert_eq!(map.len(), 2);
//!
//! let json = map.to_json_bytes().unwrap();
//! assert_eq!(json, br#"{"user":"alice","attempt":3}"#);
//! map.free();
//! ```

use super::error::Result;
use super::options::ReplaceAttrFn;
use super::record::{Attr, Value};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Largest entry count a map may have and still be returned to the pool.
///
/// Keeps pooled maps roughly uniform in memory cost.
pub const MAX_POOLED_SIZE: usize = 32;

/// Idle maps retained by a pool before further returns are discarded
pub const DEFAULT_POOL_CAPACITY: usize = 256;

static NEXT_STORAGE_ID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_POOL: OnceLock<AttrMapPool> = OnceLock::new();

struct Storage {
    id: u64,
    entries: Vec<(String, MapValue)>,
}

impl Storage {
    fn new() -> Box<Self> {
        Box::new(Self {
            id: NEXT_STORAGE_ID.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
        })
    }
}

struct PoolShared {
    sender: Sender<Box<Storage>>,
    receiver: Receiver<Box<Storage>>,
    allocated: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

/// Concurrency-safe pool of attribute maps
///
/// Cloning the handle shares the same pool.
#[derive(Clone)]
pub struct AttrMapPool {
    shared: Arc<PoolShared>,
}

impl AttrMapPool {
    /// Create a pool that keeps at most `capacity` idle maps
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            shared: Arc::new(PoolShared {
                sender,
                receiver,
                allocated: AtomicU64::new(0),
                reused: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
            }),
        }
    }

    /// The process-wide pool used by [`AttrMap::acquire`]
    pub fn global() -> &'static AttrMapPool {
        GLOBAL_POOL.get_or_init(|| AttrMapPool::new(DEFAULT_POOL_CAPACITY))
    }

    /// Take an empty map from the pool, allocating when none is idle
    pub fn acquire(&self) -> AttrMap {
        let storage = match self.shared.receiver.try_recv() {
            Ok(storage) => {
                self.shared.reused.fetch_add(1, Ordering::Relaxed);
                storage
            }
            Err(_) => {
                self.shared.allocated.fetch_add(1, Ordering::Relaxed);
                Storage::new()
            }
        };
        debug_assert!(storage.entries.is_empty());

        AttrMap {
            storage,
            pool: self.clone(),
        }
    }

    fn release(&self, mut storage: Box<Storage>) {
        storage.entries.shrink_to(MAX_POOLED_SIZE);
        if self.shared.sender.try_send(storage).is_err() {
            self.shared.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Maps currently idle in the pool
    pub fn idle(&self) -> usize {
        self.shared.receiver.len()
    }

    /// Maps allocated because the pool was empty
    pub fn allocated(&self) -> u64 {
        self.shared.allocated.load(Ordering::Relaxed)
    }

    /// Acquisitions served from idle maps
    pub fn reused(&self) -> u64 {
        self.shared.reused.load(Ordering::Relaxed)
    }

    /// Freed maps that were not kept (oversized, or pool full)
    pub fn discarded(&self) -> u64 {
        self.shared.discarded.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for AttrMapPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttrMapPool")
            .field("idle", &self.idle())
            .field("allocated", &self.allocated())
            .field("reused", &self.reused())
            .field("discarded", &self.discarded())
            .finish()
    }
}

/// Value stored in an [`AttrMap`]: a scalar, or a flattened group
#[derive(Debug)]
pub enum MapValue {
    Value(Value),
    Map(AttrMap),
}

impl MapValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            MapValue::Value(v) => Some(v),
            MapValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttrMap> {
        match self {
            MapValue::Map(m) => Some(m),
            MapValue::Value(_) => None,
        }
    }

    fn release(self) {
        if let MapValue::Map(map) = self {
            map.free();
        }
    }
}

impl Serialize for MapValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MapValue::Value(v) => v.serialize(serializer),
            MapValue::Map(m) => m.serialize(serializer),
        }
    }
}

/// Insertion-ordered key/value map used for attribute flattening
///
/// Not safe for concurrent mutation; one owner at a time, from `acquire`
/// until `free`.
pub struct AttrMap {
    storage: Box<Storage>,
    pool: AttrMapPool,
}

impl AttrMap {
    /// Take an empty map from the global pool
    pub fn acquire() -> AttrMap {
        AttrMapPool::global().acquire()
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// A group value is flattened into a nested map from the same pool.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let entry = match value.into() {
            Value::Group(attrs) => {
                let mut child = self.pool.acquire();
                for attr in attrs {
                    child.set(attr.key, attr.value);
                }
                MapValue::Map(child)
            }
            scalar => MapValue::Value(scalar),
        };
        self.insert(key.into(), entry);
        self
    }

    fn insert(&mut self, key: String, value: MapValue) {
        let entries = &mut self.storage.entries;
        match entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => std::mem::replace(&mut entries[idx].1, value).release(),
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MapValue> {
        self.storage
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapValue)> {
        self.storage.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Identity of the backing allocation, stable across pool round trips
    pub fn id(&self) -> u64 {
        self.storage.id
    }

    /// Clear all entries but keep this map for immediate reuse.
    ///
    /// Nested maps are freed back to the pool.
    pub fn reset(&mut self) {
        for (_, value) in self.storage.entries.drain(..) {
            value.release();
        }
    }

    /// Release this map and every nested map.
    ///
    /// The map itself goes back to its pool only if it held at most
    /// [`MAX_POOLED_SIZE`] entries before clearing.
    pub fn free(self) {
        let len = self.len();
        let AttrMap { mut storage, pool } = self;

        for (_, value) in storage.entries.drain(..) {
            value.release();
        }

        if len <= MAX_POOLED_SIZE {
            pool.release(storage);
        } else {
            pool.shared.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Serialize current contents as a JSON object
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Add `attrs` to this map, running each scalar through `replace` first.
    ///
    /// Empty groups are skipped and groups with an empty key are inlined.
    pub fn extend_attrs(&mut self, attrs: &[Attr], replace: Option<&ReplaceAttrFn>) -> &mut Self {
        let mut groups = Vec::new();
        self.extend_in_group(attrs, replace, &mut groups);
        self
    }

    fn extend_in_group(
        &mut self,
        attrs: &[Attr],
        replace: Option<&ReplaceAttrFn>,
        groups: &mut Vec<String>,
    ) {
        for attr in attrs {
            match &attr.value {
                Value::Group(children) if children.is_empty() => {}
                Value::Group(children) if attr.key.is_empty() => {
                    self.extend_in_group(children, replace, groups);
                }
                Value::Group(children) => {
                    let mut child = self.pool.acquire();
                    groups.push(attr.key.clone());
                    child.extend_in_group(children, replace, groups);
                    groups.pop();

                    if child.is_empty() {
                        child.free();
                    } else {
                        self.insert(attr.key.clone(), MapValue::Map(child));
                    }
                }
                _ => {
                    let attr = match replace {
                        Some(replace) => match replace(groups, attr.clone()) {
                            Some(attr) => attr,
                            None => continue,
                        },
                        None => attr.clone(),
                    };
                    self.set(attr.key, attr.value);
                }
            }
        }
    }
}

impl Serialize for AttrMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl std::fmt::Debug for AttrMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Flatten a record's attributes into a map from the global pool
pub fn flatten(attrs: &[Attr], replace: Option<&ReplaceAttrFn>) -> AttrMap {
    let mut map = AttrMap::acquire();
    map.extend_attrs(attrs, replace);
    map
}
