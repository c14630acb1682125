//! The lock a point serializes its writes on.
//!
//! A lock is shared by `Arc`: points that must be mutually exclusive hold
//! clones of the same `PointLock`, uncoupled points each hold their own.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

/// Mutual exclusion for one point, or for a group of coupled points.
///
/// The lock is not reentrant. A thread holding it (for example, inside an
/// action callback) must not try to take it again; read through
/// `Point::unlocked_get` instead.
#[derive(Debug, Default)]
pub struct PointLock {
    inner: Mutex<()>,
}

/// Proof that the lock is held. Releases on drop.
pub type PointGuard<'a> = MutexGuard<'a, ()>;

impl PointLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a lock ready to be shared between points.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Block until the lock is available.
    pub fn acquire(&self) -> PointGuard<'_> {
        self.inner.lock()
    }

    /// Wait at most `timeout` for the lock.
    pub fn acquire_for(&self, timeout: Duration) -> Option<PointGuard<'_>> {
        self.inner.try_lock_for(timeout)
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

/// True if both handles point at the same underlying lock.
pub fn shares_with(a: &Arc<PointLock>, b: &Arc<PointLock>) -> bool {
    Arc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn acquire_for_times_out_while_held() {
        let lock = PointLock::shared();
        let _guard = lock.acquire();
        assert!(lock.is_locked());

        let other = Arc::clone(&lock);
        let acquired = thread::spawn(move || other.acquire_for(Duration::from_millis(20)).is_some())
            .join()
            .unwrap();
        assert!(!acquired);
    }

    #[test]
    fn released_on_drop() {
        let lock = PointLock::new();
        {
            let _guard = lock.acquire();
        }
        assert!(!lock.is_locked());
        assert!(lock.acquire_for(Duration::from_millis(1)).is_some());
    }

    #[test]
    fn sharing_is_identity() {
        let a = PointLock::shared();
        let b = Arc::clone(&a);
        let c = PointLock::shared();
        assert!(shares_with(&a, &b));
        assert!(!shares_with(&a, &c));
    }
}
