//! Read side of the guest list used by the dashboard and the attendee page.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::GuestError;
use crate::models::{Guest, GuestStats, GuestStatus};
use crate::store::GuestStore;

#[derive(Clone)]
pub struct RosterService {
    store: Arc<dyn GuestStore>,
}

impl RosterService {
    pub fn new(store: Arc<dyn GuestStore>) -> Self {
        Self { store }
    }

    /// Guests newest first, optionally restricted to one status.
    pub async fn list(&self, status: Option<GuestStatus>) -> Result<Vec<Guest>, GuestError> {
        let mut guests = self.store.list().await?;
        if let Some(status) = status {
            guests.retain(|g| g.status == status);
        }
        guests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(guests)
    }

    /// A single guest, as polled by the attendee waiting for a decision.
    pub async fn get(&self, id: Uuid) -> Result<Guest, GuestError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(GuestError::NotFound(id))
    }

    pub async fn stats(&self) -> Result<GuestStats, GuestError> {
        let guests = self.store.list().await?;
        Ok(GuestStats::from_guests(&guests))
    }

    /// Delete every guest. Irreversible.
    pub async fn reset(&self) -> Result<(), GuestError> {
        self.store.clear().await?;
        warn!("Guest list cleared");
        Ok(())
    }
}
