//! Interning cache for content hashes.
//!
//! [`HashCache::instance`] maps a raw hash string to one canonical
//! [`HashHandle`]. Handles compare by identity of the interned allocation, so
//! equality of two file hashes is a pointer comparison rather than a string
//! comparison. The cache never evicts and owns every interned string for as
//! long as the cache (or any handle) is alive.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared reference to an interned hash string.
///
/// Two handles are equal iff they point at the same interned allocation.
#[derive(Clone)]
pub struct HashHandle(Arc<str>);

impl HashHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for HashHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for HashHandle {}

impl Hash for HashHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const u8 as usize).hash(state);
    }
}

impl fmt::Debug for HashHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashHandle({:?})", &*self.0)
    }
}

impl fmt::Display for HashHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flyweight store of hash strings.
pub struct HashCache {
    entries: Mutex<HashSet<Arc<str>>>,
    empty: HashHandle,
    hits: AtomicU64,
    lookups: AtomicU64,
}

impl HashCache {
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut entries = HashSet::new();
        entries.insert(Arc::clone(&empty));
        Self {
            entries: Mutex::new(entries),
            empty: HashHandle(empty),
            hits: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
        }
    }

    /// Returns the canonical handle for `raw`, interning it on first use.
    ///
    /// Lookup and insert happen under one lock, so concurrent first calls with
    /// equal values all receive the same handle.
    pub fn instance(&self, raw: &str) -> HashHandle {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(raw) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return HashHandle(Arc::clone(existing));
        }
        let interned: Arc<str> = Arc::from(raw);
        entries.insert(Arc::clone(&interned));
        HashHandle(interned)
    }

    /// The canonical handle carried by records that were never hashed.
    pub fn empty(&self) -> HashHandle {
        self.empty.clone()
    }

    pub fn is_empty_handle(&self, handle: &HashHandle) -> bool {
        *handle == self.empty
    }

    /// Number of distinct interned values, including the empty value.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, lookups)` counters since creation.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.lookups.load(Ordering::Relaxed),
        )
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::new()
    }
}
