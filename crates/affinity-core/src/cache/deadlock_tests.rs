//! Deadlock detection tests for the cache layer.
//!
//! Uses timeouts to detect potential deadlocks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use super::MemoCache;
use crate::error::Result;

/// Timeout for deadlock detection (if operation takes longer, likely deadlocked)
const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(5);

fn wait_for(completed: &AtomicBool, what: &str) {
    let start = Instant::now();
    while !completed.load(Ordering::SeqCst) {
        if start.elapsed() > DEADLOCK_TIMEOUT {
            panic!("DEADLOCK DETECTED: {what} did not complete within timeout");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_memo_cache_no_deadlock_concurrent_ops() {
    let cache: Arc<MemoCache<u64, String>> = Arc::new(MemoCache::new(
        64,
        |key: &u64| -> Result<String> { Ok(format!("value_{key}")) },
    ));
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = Arc::clone(&completed);

    let handle = thread::spawn(move || {
        let mut handles = vec![];
        for t in 0..4u64 {
            let cache_clone = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..200u64 {
                    let key = (t * 200 + i) % 100;
                    assert_eq!(cache_clone.get(&key).unwrap(), format!("value_{key}"));
                    if i % 3 == 0 {
                        cache_clone.remove(&key);
                    }
                    if i % 50 == 0 {
                        cache_clone.clear();
                    }
                    let _ = cache_clone.stats();
                }
            }));
        }
        for h in handles {
            h.join().expect("Thread panicked");
        }
        assert!(cache.len() <= 64);
        completed_clone.store(true, Ordering::SeqCst);
    });

    wait_for(&completed, "memo cache operations");
    handle.join().expect("Main thread panicked");
}

#[test]
fn test_retriever_may_reenter_cache() {
    // A retriever that reads another key from the same cache only works if
    // the lock is released around retrieval.
    static CACHE: OnceLock<MemoCache<u32, u32>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        MemoCache::new(16, |key: &u32| -> Result<u32> {
            if *key == 0 {
                return Ok(1);
            }
            let previous = CACHE
                .get()
                .map_or(Ok(1), |cache| cache.get(&(key - 1)))?;
            Ok(previous * 2)
        })
    });
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = Arc::clone(&completed);

    let handle = thread::spawn(move || {
        assert_eq!(cache.get(&5).unwrap(), 32);
        completed_clone.store(true, Ordering::SeqCst);
    });

    wait_for(&completed, "re-entrant retrieval");
    handle.join().expect("Thread panicked");
    assert_eq!(cache.len(), 6);
}

#[test]
fn test_racing_misses_both_retrieve_and_last_write_wins() {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let gate = Arc::new(std::sync::Barrier::new(2));
    let gate_clone = Arc::clone(&gate);
    let cache = Arc::new(MemoCache::new(4, move |key: &u32| -> Result<u32> {
        counter.fetch_add(1, Ordering::SeqCst);
        gate_clone.wait();
        Ok(*key)
    }));
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = Arc::clone(&completed);

    // Act
    let handle = thread::spawn(move || {
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get(&1).unwrap())
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().expect("Thread panicked"), 1);
        }
        assert_eq!(cache.len(), 1);
        completed_clone.store(true, Ordering::SeqCst);
    });

    // Assert
    wait_for(&completed, "racing retrievals");
    handle.join().expect("Main thread panicked");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
