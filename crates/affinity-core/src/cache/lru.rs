//! LRU-bounded map with optional per-entry expiry.
//!
//! Entries live in a dense vector linked into a recency chain by index, so
//! lookup, promotion, insertion and eviction are all O(1).

#![allow(clippy::cast_precision_loss)] // Precision loss acceptable for hit rate calculation

use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

const NIL: usize = usize::MAX;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups that found a live entry.
    pub hits: u64,
    /// Number of lookups that found nothing or an expired entry.
    pub misses: u64,
    /// Number of entries dropped to stay within capacity.
    pub evictions: u64,
    /// Number of entries purged because they were past their expiry.
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    expires_at: Option<Instant>,
    /// Towards the most recently used end.
    prev: usize,
    /// Towards the least recently used end.
    next: usize,
}

impl<K, V> Entry<K, V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Hash map plus usage-order chain, bounded to a fixed capacity.
///
/// `get` and `put` promote the touched entry to most recently used.
/// Inserting a new key at capacity evicts the least recently used entry.
/// Expired entries are purged lazily when next looked up.
#[derive(Debug)]
pub struct LruMap<K, V> {
    capacity: usize,
    index: FxHashMap<K, usize>,
    entries: Vec<Entry<K, V>>,
    head: usize,
    tail: usize,
    stats: CacheStats,
}

impl<K, V> LruMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a map holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            index: FxHashMap::default(),
            entries: Vec::with_capacity(capacity.min(1024)),
            head: NIL,
            tail: NIL,
            stats: CacheStats::default(),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries.
    ///
    /// Expired entries count until a lookup or [`LruMap::purge_expired`]
    /// drops them.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit, miss, eviction and expiry counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Looks up `key`, promoting it to most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        if self.entries[idx].is_expired(Instant::now()) {
            self.remove_at(idx);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }
        self.promote(idx);
        self.stats.hits += 1;
        Some(&self.entries[idx].value)
    }

    /// Whether a live entry exists for `key`. Does not change recency.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.index
            .get(key)
            .is_some_and(|&idx| !self.entries[idx].is_expired(Instant::now()))
    }

    /// Inserts or replaces `key`, returning the previous live value.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert_entry(key, value, None)
    }

    /// Inserts or replaces `key` with an entry that expires after `ttl`.
    pub fn put_with_ttl(&mut self, key: K, value: V, ttl: Duration) -> Option<V> {
        let expires_at = Instant::now().checked_add(ttl);
        self.insert_entry(key, value, expires_at)
    }

    /// Removes `key`, returning its value if present and not expired.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = *self.index.get(key)?;
        let entry = self.remove_at(idx);
        if entry.is_expired(Instant::now()) {
            self.stats.expirations += 1;
            return None;
        }
        Some(entry.value)
    }

    /// Drops every expired entry, returning how many were dropped.
    ///
    /// Afterwards `len()` counts live entries only.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        let mut idx = self.entries.len();
        // Back to front: `remove_at` only moves the last entry into the slot.
        while idx > 0 {
            idx -= 1;
            if self.entries[idx].is_expired(now) {
                self.remove_at(idx);
                purged += 1;
            }
        }
        self.stats.expirations += purged as u64;
        purged
    }

    /// Removes every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let entry = &self.entries[cursor];
            cursor = entry.next;
            Some(&entry.key)
        })
    }

    fn insert_entry(&mut self, key: K, value: V, expires_at: Option<Instant>) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            let now = Instant::now();
            let entry = &mut self.entries[idx];
            let was_expired = entry.is_expired(now);
            entry.expires_at = expires_at;
            let old = std::mem::replace(&mut entry.value, value);
            self.promote(idx);
            return (!was_expired).then_some(old);
        }

        if self.entries.len() >= self.capacity && self.tail != NIL {
            self.remove_at(self.tail);
            self.stats.evictions += 1;
        }

        let idx = self.entries.len();
        self.entries.push(Entry {
            key: key.clone(),
            value,
            expires_at,
            prev: NIL,
            next: NIL,
        });
        self.index.insert(key, idx);
        self.attach_front(idx);
        None
    }

    fn promote(&mut self, idx: usize) {
        if self.head != idx {
            self.detach(idx);
            self.attach_front(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.entries[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.entries[next].prev = prev;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.entries[idx].prev = NIL;
        self.entries[idx].next = old_head;
        if old_head == NIL {
            self.tail = idx;
        } else {
            self.entries[old_head].prev = idx;
        }
        self.head = idx;
    }

    /// Unlinks and removes the entry at `idx`, moving the last entry into
    /// the vacated slot.
    fn remove_at(&mut self, idx: usize) -> Entry<K, V> {
        self.detach(idx);
        let removed = self.entries.swap_remove(idx);
        self.index.remove(&removed.key);

        if idx < self.entries.len() {
            let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
            if prev == NIL {
                self.head = idx;
            } else {
                self.entries[prev].next = idx;
            }
            if next == NIL {
                self.tail = idx;
            } else {
                self.entries[next].prev = idx;
            }
            if let Some(slot) = self.index.get_mut(&self.entries[idx].key) {
                *slot = idx;
            }
        }
        removed
    }
}
