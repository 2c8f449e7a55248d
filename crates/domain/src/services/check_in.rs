//! Door check-in.
//!
//! A scan is checked in a fixed order: unknown payload, then review status,
//! then prior use, and only then admission. A rejected guest always reads
//! "not approved" and a second scan of a used ticket always reads "already used".

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::guest_locks::GuestLocks;
use crate::error::GuestError;
use crate::models::{Guest, GuestStatus, GuestUpdate, ScanResult};
use crate::store::GuestStore;

/// How concurrent scans of the same ticket are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSerialization {
    /// Plain read-then-write. Two devices scanning the same unused ticket at
    /// the same moment can both be granted, and a scan racing an override
    /// reject can check in a guest that was just rejected.
    Unguarded,
    /// Scans of one guest run one at a time within this process, and never
    /// overlap an admin decision on that guest.
    #[default]
    PerGuestLock,
    /// Admission is a conditional write in the store; the losing scan reads
    /// the ticket as already used. Holds across processes on a shared database.
    CompareAndSwap,
}

/// Validates scanned QR payloads and admits guests once.
pub struct CheckInService {
    store: Arc<dyn GuestStore>,
    serialization: ScanSerialization,
    locks: Arc<GuestLocks>,
}

impl CheckInService {
    pub fn new(store: Arc<dyn GuestStore>, serialization: ScanSerialization) -> Self {
        Self {
            store,
            serialization,
            locks: Arc::new(GuestLocks::new()),
        }
    }

    /// Share the per-guest lock table with the approval service.
    pub fn with_locks(mut self, locks: Arc<GuestLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Validate a scanned payload and check the guest in if admissible.
    ///
    /// Denied scans are returned as `ScanResult`s. Only a failed lookup is an error.
    pub async fn scan(&self, payload: &str) -> Result<ScanResult, GuestError> {
        let Ok(id) = Uuid::parse_str(payload.trim()) else {
            info!(payload_len = payload.len(), "Scan rejected: malformed payload");
            return Ok(ScanResult::invalid_qr());
        };

        let result = match self.serialization {
            ScanSerialization::Unguarded => self.scan_unguarded(id).await?,
            ScanSerialization::PerGuestLock => {
                let _guard = self.locks.lock(id).await;
                self.scan_unguarded(id).await?
            }
            ScanSerialization::CompareAndSwap => self.scan_conditional(id).await?,
        };

        info!(
            guest_id = %id,
            outcome = %result.outcome,
            valid = result.valid,
            "Scan processed"
        );
        Ok(result)
    }

    async fn scan_unguarded(&self, id: Uuid) -> Result<ScanResult, GuestError> {
        let guest = match self.store.find_by_id(id).await? {
            Some(guest) => guest,
            None => return Ok(ScanResult::invalid_qr()),
        };
        if let Some(denied) = deny_reason(&guest) {
            return Ok(denied);
        }

        match self
            .store
            .update(id, GuestUpdate::check_in(Utc::now()))
            .await
        {
            Ok(updated) => Ok(ScanResult::granted(updated)),
            Err(e) => {
                error!(guest_id = %id, error = %e, "Failed to record check-in");
                Ok(ScanResult::not_recorded())
            }
        }
    }

    async fn scan_conditional(&self, id: Uuid) -> Result<ScanResult, GuestError> {
        let guest = match self.store.find_by_id(id).await? {
            Some(guest) => guest,
            None => return Ok(ScanResult::invalid_qr()),
        };
        if let Some(denied) = deny_reason(&guest) {
            return Ok(denied);
        }

        match self.store.mark_used_if_unused(id, Utc::now()).await {
            Ok(Some(updated)) => Ok(ScanResult::granted(updated)),
            Ok(None) => {
                // Lost the race (or the guest changed in between): report current state.
                warn!(guest_id = %id, "Conditional check-in lost to a concurrent update");
                let current = self.store.find_by_id(id).await?;
                Ok(match current {
                    Some(guest) => deny_reason(&guest).unwrap_or_else(ScanResult::not_recorded),
                    None => ScanResult::invalid_qr(),
                })
            }
            Err(e) => {
                error!(guest_id = %id, error = %e, "Failed to record check-in");
                Ok(ScanResult::not_recorded())
            }
        }
    }

}

/// Status first, then prior use. `None` means the guest may enter.
fn deny_reason(guest: &Guest) -> Option<ScanResult> {
    if guest.status != GuestStatus::Approved {
        return Some(ScanResult::not_approved());
    }
    if guest.is_used {
        return Some(ScanResult::already_used(guest.clone()));
    }
    None
}
