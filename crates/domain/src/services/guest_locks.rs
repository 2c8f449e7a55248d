//! In-process locks keyed by guest id.
//!
//! Admin decisions and door scans of the same guest take the same lock, so a
//! reject can never interleave with a check-in inside one process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

type GuestLock = Arc<tokio::sync::Mutex<()>>;

/// Lock table shared by the services that mutate a single guest.
#[derive(Debug, Default)]
pub struct GuestLocks {
    locks: Mutex<HashMap<Uuid, GuestLock>>,
}

impl GuestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one guest.
    pub async fn lock(&self, id: Uuid) -> GuestLockGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(id).or_default().clone()
        };
        let guard = lock.clone().lock_owned().await;
        GuestLockGuard {
            owner: self,
            id,
            lock,
            guard: Some(guard),
        }
    }

    /// Number of guests with a held or awaited lock.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the map entry once nobody else holds or waits on it.
    fn release(&self, id: Uuid, lock: &GuestLock) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = locks.get(&id) {
            // One reference in the map, one in the releasing guard.
            if Arc::ptr_eq(existing, lock) && Arc::strong_count(lock) == 2 {
                locks.remove(&id);
            }
        }
    }
}

/// Held for as long as one guest must not change under the caller.
pub struct GuestLockGuard<'a> {
    owner: &'a GuestLocks,
    id: Uuid,
    lock: GuestLock,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GuestLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner.release(self.id, &self.lock);
    }
}
