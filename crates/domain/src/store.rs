//! Guest storage abstraction.
//!
//! Services only see `GuestStore`. Backends live in the persistence crate;
//! the in-memory store is kept here for tests and the `memory` backend.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Guest, GuestStatus, GuestUpdate};

/// Durable mapping of guests keyed by id.
///
/// Every call completes its write before returning.
#[async_trait::async_trait]
pub trait GuestStore: Send + Sync {
    /// All guests. Order is stable until the next mutation and otherwise unspecified.
    async fn list(&self) -> Result<Vec<Guest>, StoreError>;

    /// Insert a new guest. Fails with `DuplicateId` if the id is taken.
    async fn insert(&self, guest: Guest) -> Result<Guest, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>, StoreError>;

    /// Apply a patch and return the updated guest. Fails with `NotFound`.
    async fn update(&self, id: Uuid, update: GuestUpdate) -> Result<Guest, StoreError>;

    /// Atomically apply a patch if the guest still has status `expected` and
    /// has not been checked in.
    ///
    /// Returns `Ok(None)` when the guest exists but no longer matches,
    /// `NotFound` when it does not exist.
    async fn update_if_status(
        &self,
        id: Uuid,
        expected: GuestStatus,
        update: GuestUpdate,
    ) -> Result<Option<Guest>, StoreError>;

    /// Atomically check a guest in if it is approved and unused.
    ///
    /// Returns `Ok(None)` when the guest exists but is not admissible,
    /// `NotFound` when it does not exist.
    async fn mark_used_if_unused(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Guest>, StoreError>;

    /// Remove every guest.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Whether a guest may be checked in right now.
pub fn is_admissible(guest: &Guest) -> bool {
    guest.status == GuestStatus::Approved && !guest.is_used
}

/// Whether a guest still matches what an admin decision was based on.
pub fn matches_decision(guest: &Guest, expected: GuestStatus) -> bool {
    guest.status == expected && !guest.is_used
}

/// Insertion-ordered in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryGuestStore {
    guests: RwLock<Vec<Guest>>,
}

impl InMemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with guests.
    pub fn with_guests(guests: Vec<Guest>) -> Self {
        Self {
            guests: RwLock::new(guests),
        }
    }
}

#[async_trait::async_trait]
impl GuestStore for InMemoryGuestStore {
    async fn list(&self) -> Result<Vec<Guest>, StoreError> {
        Ok(self.guests.read().await.clone())
    }

    async fn insert(&self, guest: Guest) -> Result<Guest, StoreError> {
        let mut guests = self.guests.write().await;
        if guests.iter().any(|g| g.id == guest.id) {
            return Err(StoreError::DuplicateId(guest.id));
        }
        guests.push(guest.clone());
        Ok(guest)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>, StoreError> {
        Ok(self.guests.read().await.iter().find(|g| g.id == id).cloned())
    }

    async fn update(&self, id: Uuid, update: GuestUpdate) -> Result<Guest, StoreError> {
        let mut guests = self.guests.write().await;
        let guest = guests
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::NotFound(id))?;
        guest.apply(&update);
        Ok(guest.clone())
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: GuestStatus,
        update: GuestUpdate,
    ) -> Result<Option<Guest>, StoreError> {
        let mut guests = self.guests.write().await;
        let guest = guests
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !matches_decision(guest, expected) {
            return Ok(None);
        }
        guest.apply(&update);
        Ok(Some(guest.clone()))
    }

    async fn mark_used_if_unused(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Guest>, StoreError> {
        let mut guests = self.guests.write().await;
        let guest = guests
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !is_admissible(guest) {
            return Ok(None);
        }
        guest.apply(&GuestUpdate::check_in(at));
        Ok(Some(guest.clone()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.guests.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(name: &str) -> Guest {
        Guest::new_pending(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
            None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryGuestStore::new();
        let ana = store.insert(guest("Ana")).await.unwrap();

        let found = store.find_by_id(ana.id).await.unwrap();
        assert_eq!(found, Some(ana));
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let store = InMemoryGuestStore::new();
        let ana = guest("Ana");
        store.insert(ana.clone()).await.unwrap();

        let result = store.insert(ana.clone()).await;
        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == ana.id));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = InMemoryGuestStore::new();
        let a = store.insert(guest("Ana")).await.unwrap();
        let b = store.insert(guest("Bruno")).await.unwrap();

        let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_update_missing_guest() {
        let store = InMemoryGuestStore::new();
        let result = store.update(Uuid::new_v4(), GuestUpdate::reject()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let store = InMemoryGuestStore::new();
        let ana = store.insert(guest("Ana")).await.unwrap();

        let updated = store
            .update(ana.id, GuestUpdate::approve(ana.id))
            .await
            .unwrap();
        assert_eq!(updated.status, GuestStatus::Approved);
        assert_eq!(
            store.find_by_id(ana.id).await.unwrap().unwrap().qr_code,
            Some(ana.id.to_string())
        );
    }

    #[tokio::test]
    async fn test_mark_used_if_unused() {
        let store = InMemoryGuestStore::new();
        let ana = store.insert(guest("Ana")).await.unwrap();

        // Pending guests are not admissible.
        assert!(store
            .mark_used_if_unused(ana.id, Utc::now())
            .await
            .unwrap()
            .is_none());

        store
            .update(ana.id, GuestUpdate::approve(ana.id))
            .await
            .unwrap();
        let first = Utc::now();
        let checked = store.mark_used_if_unused(ana.id, first).await.unwrap();
        assert_eq!(checked.unwrap().used_at, Some(first));

        let second = store.mark_used_if_unused(ana.id, Utc::now()).await.unwrap();
        assert!(second.is_none());
        assert_eq!(
            store.find_by_id(ana.id).await.unwrap().unwrap().used_at,
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_update_if_status() {
        let store = InMemoryGuestStore::new();
        let ana = store.insert(guest("Ana")).await.unwrap();

        let stale = store
            .update_if_status(ana.id, GuestStatus::Approved, GuestUpdate::reject())
            .await
            .unwrap();
        assert!(stale.is_none());

        let approved = store
            .update_if_status(ana.id, GuestStatus::Pending, GuestUpdate::approve(ana.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, GuestStatus::Approved);

        // A checked-in guest no longer matches any decision.
        store.mark_used_if_unused(ana.id, Utc::now()).await.unwrap();
        let result = store
            .update_if_status(ana.id, GuestStatus::Approved, GuestUpdate::reject())
            .await
            .unwrap();
        assert!(result.is_none());
        let stored = store.find_by_id(ana.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GuestStatus::Approved);
        assert!(stored.is_used);

        let missing = store
            .update_if_status(Uuid::new_v4(), GuestStatus::Pending, GuestUpdate::reject())
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_used_missing_guest() {
        let store = InMemoryGuestStore::new();
        let result = store.mark_used_if_unused(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryGuestStore::with_guests(vec![guest("Ana"), guest("Bruno")]);
        store.clear().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
