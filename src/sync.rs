// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Poison-recovering lock helpers.
//!
//! A thread panicking while holding a lock poisons it; for registry and
//! callback state, stale data is preferable to tearing the whole client
//! session down, so these helpers log the event and recover the guard.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a read lock, recovering from poisoning if necessary.
#[inline]
pub fn resilient_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "mediacore::sync",
                "RwLock poisoned during read acquisition; recovering data"
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a write lock, recovering from poisoning if necessary.
#[inline]
pub fn resilient_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "mediacore::sync",
                "RwLock poisoned during write acquisition; recovering data"
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a mutex, recovering from poisoning if necessary.
#[inline]
pub fn resilient_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "mediacore::sync",
                "Mutex poisoned during acquisition; recovering data"
            );
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn read_and_write_normal() {
        let lock = RwLock::new(42);
        {
            let mut guard = resilient_write(&lock);
            *guard = 100;
        }
        assert_eq!(*resilient_read(&lock), 100);
    }

    #[test]
    fn read_recovers_from_poison() {
        let lock = Arc::new(RwLock::new(42));
        let poisoner = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("intentional panic to poison lock");
        });
        let _ = handle.join();

        assert_eq!(*resilient_read(&lock), 42);
    }

    #[test]
    fn mutex_recovers_from_poison() {
        let lock = Arc::new(Mutex::new(7));
        let poisoner = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("intentional panic to poison lock");
        });
        let _ = handle.join();

        let mut guard = resilient_lock(&lock);
        *guard = 8;
        drop(guard);
        assert_eq!(*resilient_lock(&lock), 8);
    }
}
