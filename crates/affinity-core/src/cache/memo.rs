//! Memoizing cache with a pluggable miss handler.

use std::hash::Hash;

use parking_lot::Mutex;

use super::lru::{CacheStats, LruMap};
use crate::error::Result;

/// Computes the value for a key on a cache miss.
pub trait Retriever<K, V>: Send + Sync {
    /// Produces the value for `key`.
    fn retrieve(&self, key: &K) -> Result<V>;
}

impl<K, V, F> Retriever<K, V> for F
where
    F: Fn(&K) -> Result<V> + Send + Sync,
{
    fn retrieve(&self, key: &K) -> Result<V> {
        self(key)
    }
}

/// Key-value cache that fills misses from a [`Retriever`].
///
/// Values are cloned out on every hit, so `V` is typically an `Arc` or a
/// small `Copy` value. Failed retrievals are never cached.
pub struct MemoCache<K, V> {
    entries: Mutex<LruMap<K, V>>,
    retriever: Box<dyn Retriever<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache bounded to `capacity` entries.
    pub fn new(capacity: usize, retriever: impl Retriever<K, V> + 'static) -> Self {
        Self {
            entries: Mutex::new(LruMap::new(capacity)),
            retriever: Box::new(retriever),
        }
    }

    /// Returns the cached value for `key`, retrieving and storing it on a
    /// miss.
    ///
    /// The lock is released while the retriever runs.
    pub fn get(&self, key: &K) -> Result<V> {
        let cached = self.entries.lock().get(key).cloned();
        if let Some(value) = cached {
            return Ok(value);
        }
        let value = self.retriever.retrieve(key)?;
        self.entries.lock().put(key.clone(), value.clone());
        Ok(value)
    }

    /// Returns the cached value for `key` without retrieving.
    pub fn get_cached(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    /// Stores `value` for `key`, bypassing the retriever.
    pub fn put(&self, key: K, value: V) {
        self.entries.lock().put(key, value);
    }

    /// Invalidates `key`.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key)
    }

    /// Invalidates every key.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of cached entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }

    /// Snapshot of the underlying map's counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.entries.lock().stats()
    }
}

impl<K, V> std::fmt::Debug for MemoCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("MemoCache")
            .field("len", &entries.len())
            .field("capacity", &entries.capacity())
            .finish_non_exhaustive()
    }
}
