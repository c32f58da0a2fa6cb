// ── Operation guard ──
//
// Try-acquire mutual exclusion for hub operations. Contention never waits:
// the caller gets `None` and drops its work, so a held button that keeps
// firing cannot stack up redundant activity switches.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A non-blocking, cloneable lock. All clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct OperationGuard {
    lock: Arc<Mutex<()>>,
}

/// Proof of exclusive access; releases the guard when dropped.
#[derive(Debug)]
pub struct OperationPermit {
    _guard: OwnedMutexGuard<()>,
}

impl OperationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard if nobody holds it.
    pub fn try_enter(&self) -> Option<OperationPermit> {
        Arc::clone(&self.lock)
            .try_lock_owned()
            .ok()
            .map(|guard| OperationPermit { _guard: guard })
    }

    /// `true` while a permit is outstanding.
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
