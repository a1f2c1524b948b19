//! Concurrent access safety for staged mutations
//!
//! The original design relied on a single cooperative thread of control for
//! store safety. Under preemptive scheduling, per-path locks preserve the
//! same guarantee: no two concurrent sub-operations interleave a
//! read-modify-write on the same destination path.

use crate::store::normalize;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Per-path lock manager.
///
/// Locks are keyed by the store's normalized path form, so two spellings of
/// the same file contend on one lock.
pub struct PathLockManager {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get the lock guarding `path`, creating it on first use.
    pub fn get_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let key = normalize(path);
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(&key) {
                return lock.clone();
            }
        }

        // Double-check after acquiring the write lock (another thread might
        // have created it).
        let mut map = self.locks.write();
        map.entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}
