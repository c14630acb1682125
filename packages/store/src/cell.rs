//! One store per process, initialized explicitly.

use std::sync::OnceLock;

use parking_lot::Mutex;
use statema_point::Error;

use crate::Store;

/// A slot for a process-wide store.
///
/// Construction runs at most once, even when several threads race to
/// initialize. A failed construction leaves the cell empty so a later call
/// can retry.
///
/// ```rust
/// use statema_store::{Schema, Store, StoreCell};
/// use statema_point::PointDecl;
///
/// static SETTINGS: StoreCell = StoreCell::new();
///
/// let store = SETTINGS
///     .get_or_try_init(|| Store::new(&Schema::new().point("debug", PointDecl::new(false))))
///     .unwrap();
/// assert!(store.contains("debug"));
/// ```
pub struct StoreCell {
    store: OnceLock<Store>,
    init: Mutex<()>,
}

impl StoreCell {
    pub const fn new() -> Self {
        Self {
            store: OnceLock::new(),
            init: parking_lot::const_mutex(()),
        }
    }

    pub fn get(&self) -> Option<&Store> {
        self.store.get()
    }

    pub fn get_or_try_init<F>(&self, init: F) -> Result<&Store, Error>
    where
        F: FnOnce() -> Result<Store, Error>,
    {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }
        let _guard = self.init.lock();
        if let Some(store) = self.store.get() {
            return Ok(store);
        }
        let store = init()?;
        tracing::debug!("Initialized global store {}", store.config().label);
        Ok(self.store.get_or_init(|| store))
    }
}

impl Default for StoreCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;
    use statema_point::PointDecl;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn initializes_once_under_contention() {
        let cell = Arc::new(StoreCell::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    cell.get_or_try_init(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Store::new(&Schema::new().point("n", PointDecl::new(0i64)))
                    })
                    .map(|store| store.len())
                    .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_init_can_retry() {
        let cell = StoreCell::new();
        let schema = Schema::new().point("a", PointDecl::new(0i64).share_lock_with("nope"));
        assert!(cell.get_or_try_init(|| Store::new(&schema)).is_err());
        assert!(cell.get().is_none());

        let ok = Schema::new().point("a", PointDecl::new(0i64));
        assert!(cell.get_or_try_init(|| Store::new(&ok)).is_ok());
        assert!(cell.get().is_some());
    }
}
