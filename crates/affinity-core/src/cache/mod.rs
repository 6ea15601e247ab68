//! Caching layer: an LRU-bounded map and a memoizing cache built on it.
//!
//! # Thread-Safety
//!
//! [`LruMap`] is a plain single-owner structure. [`MemoCache`] guards one
//! behind a `parking_lot::Mutex` held only around map operations, never
//! across a retriever call. Two threads missing the same key may both
//! retrieve it; the last write wins.

mod lru;
mod memo;

pub use lru::{CacheStats, LruMap};
pub use memo::{MemoCache, Retriever};

#[cfg(test)]
mod deadlock_tests;
