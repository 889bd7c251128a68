//! Useful synchronization primitives.
//!
//! Re-exports the standard library's `sync` module contents that the
//! serialization caches rely on, plus two poison-tolerant helpers.
//!
//! A panic while a cache lock is held never leaves a cache in a state that
//! is unsafe to read (entries are only ever inserted whole), so poisoned
//! locks are recovered instead of propagated.

// -----------------------------------------------------------------------------
// Exports

pub use std::sync::{
    Arc, LazyLock, Mutex, MutexGuard, OnceLock, PoisonError, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Weak,
};

pub mod atomic {
    //! Atomic types, re-exported from `core`.
    pub use core::sync::atomic::{
        AtomicBool, AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering,
    };
}

// -----------------------------------------------------------------------------
// Helpers

/// Acquire a read guard, recovering from poisoning.
#[inline]
pub fn read_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquire a write guard, recovering from poisoning.
#[inline]
pub fn write_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Acquire a mutex guard, recovering from poisoning.
#[inline]
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_lock_is_recovered() {
        let lock = Arc::new(RwLock::new(1_u32));
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(lock.is_poisoned());
        *write_lock(&lock) += 1;
        assert_eq!(*read_lock(&lock), 2);
    }
}
