//! Per-key mutual exclusion.
//!
//! The workflow serializes work per item (availability check through
//! reservation write) and per order (cancel against advance). Locks are
//! created on first use and dropped again once nobody holds or waits on them.
//!
//! Lock order across the workspace is always order -> item.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

#[derive(Debug)]
pub struct KeyedLocks<K> {
    name: &'static str,
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Copy + Eq + Hash + core::fmt::Display,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// A panic inside another holder does not wedge the key: poisoned locks
    /// are recovered, since the guarded data is `()` and store writes are
    /// atomic on their own.
    pub fn with_lock<T>(&self, key: K, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key).or_default().clone()
        };

        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            debug!(lock = self.name, %key, "lock acquired");
            f()
        };

        self.release_slot(key, slot);
        result
    }

    /// Number of keys currently tracked (held or waited on).
    pub fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release_slot(&self, key: K, slot: Arc<Mutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(&key);
        }
    }
}
