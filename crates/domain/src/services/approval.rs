//! Approval and rejection of guest registrations.
//!
//! Approval commits the status change first and then notifies the guest on a
//! best-effort basis. A failed notification is logged and never rolled back,
//! so a guest can be approved without having received the message.
//!
//! A decision is written only if the guest still has the status it was
//! checked against and has not been checked in meanwhile.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::guest_locks::GuestLocks;
use super::notification::{ApprovalNotification, NotificationGateway, NotificationResult};
use crate::error::GuestError;
use crate::models::{Guest, GuestStatus, GuestUpdate};
use crate::store::GuestStore;

/// Settings for the approval flow.
#[derive(Debug, Clone)]
pub struct ApprovalSettings {
    /// Event name and date included in approval messages.
    pub event_label: String,
    /// Allow moving a guest between `approved` and `rejected` after the first decision.
    pub allow_status_override: bool,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            event_label: "Private event".to_string(),
            allow_status_override: false,
        }
    }
}

/// Re-reads allowed when a decision loses a race with another writer.
const MAX_DECISION_ATTEMPTS: usize = 3;

/// Admin decisions on pending registrations.
#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn GuestStore>,
    notifier: Arc<dyn NotificationGateway>,
    settings: ApprovalSettings,
    locks: Arc<GuestLocks>,
}

impl ApprovalService {
    pub fn new(
        store: Arc<dyn GuestStore>,
        notifier: Arc<dyn NotificationGateway>,
        settings: ApprovalSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            settings,
            locks: Arc::new(GuestLocks::new()),
        }
    }

    /// Share the per-guest lock table with the check-in service.
    pub fn with_locks(mut self, locks: Arc<GuestLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Approve a guest, issue its QR payload and notify it.
    ///
    /// With overrides enabled, approving an already approved guest re-sends
    /// the notification without touching the record.
    pub async fn approve(&self, id: Uuid) -> Result<Guest, GuestError> {
        let guest = {
            let _guard = self.locks.lock(id).await;
            self.decide(id, GuestStatus::Approved, GuestUpdate::approve(id))
                .await?
        };

        self.notify(&guest).await;
        Ok(guest)
    }

    /// Reject a guest. Any issued QR payload is revoked.
    pub async fn reject(&self, id: Uuid) -> Result<(), GuestError> {
        let _guard = self.locks.lock(id).await;
        self.decide(id, GuestStatus::Rejected, GuestUpdate::reject())
            .await
            .map(|_| ())
    }

    /// Check the transition on a fresh read and write it conditionally.
    ///
    /// Repeating the current decision leaves the record untouched.
    async fn decide(
        &self,
        id: Uuid,
        to: GuestStatus,
        update: GuestUpdate,
    ) -> Result<Guest, GuestError> {
        let mut guest = self.load(id).await?;
        for _ in 0..MAX_DECISION_ATTEMPTS {
            self.check_transition(&guest, to)?;
            if guest.status == to {
                return Ok(guest);
            }

            match self
                .store
                .update_if_status(id, guest.status, update.clone())
                .await?
            {
                Some(updated) => {
                    info!(
                        guest_id = %id,
                        previous_status = %guest.status,
                        status = %to,
                        "Guest decision recorded"
                    );
                    return Ok(updated);
                }
                None => {
                    warn!(
                        guest_id = %id,
                        expected_status = %guest.status,
                        "Guest changed during decision, re-reading"
                    );
                    guest = self.load(id).await?;
                }
            }
        }

        Err(GuestError::InvalidTransition {
            from: guest.status,
            to,
        })
    }

    async fn load(&self, id: Uuid) -> Result<Guest, GuestError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(GuestError::NotFound(id))
    }

    fn check_transition(&self, guest: &Guest, to: GuestStatus) -> Result<(), GuestError> {
        let from = guest.status;
        let allowed = match from {
            GuestStatus::Pending => true,
            _ if !self.settings.allow_status_override => false,
            // A checked-in guest must stay approved.
            GuestStatus::Approved => to == GuestStatus::Approved || !guest.is_used,
            GuestStatus::Rejected => true,
        };

        if allowed {
            Ok(())
        } else {
            warn!(
                guest_id = %guest.id,
                from = %from,
                to = %to,
                is_used = guest.is_used,
                "Rejected status transition"
            );
            Err(GuestError::InvalidTransition { from, to })
        }
    }

    async fn notify(&self, guest: &Guest) {
        let notification = ApprovalNotification {
            to_email: guest.email.clone(),
            to_name: guest.name.clone(),
            qr_payload: guest.qr_payload(),
            event_label: self.settings.event_label.clone(),
        };

        match self.notifier.send_approval(&notification).await {
            NotificationResult::Sent => {
                info!(guest_id = %guest.id, "Approval notification sent");
            }
            NotificationResult::Skipped => {
                debug!(guest_id = %guest.id, "Approval notification skipped");
            }
            NotificationResult::Failed(reason) => {
                warn!(
                    guest_id = %guest.id,
                    reason = %reason,
                    "Approval notification failed; approval stays committed"
                );
            }
        }
    }
}
