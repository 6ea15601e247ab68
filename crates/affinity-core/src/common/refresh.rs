//! Refresh propagation and best-effort single-flight locking.

use parking_lot::Mutex;

/// A component whose derived state can be rebuilt from its collaborators.
///
/// `refresh` never fails: implementations log and keep their previous state
/// when a rebuild cannot complete.
pub trait Refreshable {
    /// Drops derived state and asks collaborators to do the same.
    fn refresh(&self);
}

/// Non-blocking guard that collapses overlapping refreshes into one.
///
/// A caller that finds a refresh already running returns immediately
/// without waiting for it.
#[derive(Debug, Default)]
pub struct RefreshLock {
    lock: Mutex<()>,
}

impl RefreshLock {
    /// Creates an unlocked guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` unless another refresh holds the lock.
    ///
    /// Returns `true` if `f` ran.
    pub fn run<F: FnOnce()>(&self, f: F) -> bool {
        let Some(_guard) = self.lock.try_lock() else {
            tracing::debug!("refresh already in progress, skipping");
            return false;
        };
        f();
        true
    }

    /// Returns true while a refresh is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock.is_locked()
    }
}
