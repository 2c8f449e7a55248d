//! Single-file JSON guest store for the `json_file` storage backend.
//!
//! The whole guest array is rewritten on every mutation. Writes go to a
//! sibling temp file that is renamed over the target, so a crash never
//! leaves a half-written document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use domain::models::{Guest, GuestStatus, GuestUpdate};
use domain::store::{is_admissible, matches_decision};
use domain::{GuestStore, StoreError};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::metrics::QueryTimer;

const BACKEND: &str = "json_file";

/// Guest store backed by one JSON document holding an array of guests.
#[derive(Debug)]
pub struct JsonFileGuestStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileGuestStore {
    /// Opens a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Guest>, StoreError> {
        let timer = QueryTimer::new(BACKEND, "read_guests");
        let result = tokio::fs::read(&self.path).await;
        timer.record();

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_all(&self, guests: &[Guest]) -> Result<(), StoreError> {
        let timer = QueryTimer::new(BACKEND, "write_guests");
        let result = self.write_atomically(guests).await;
        timer.record();
        result
    }

    async fn write_atomically(&self, guests: &[Guest]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(guests)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), count = guests.len(), "Guest file written");
        Ok(())
    }
}

#[async_trait::async_trait]
impl GuestStore for JsonFileGuestStore {
    async fn list(&self) -> Result<Vec<Guest>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn insert(&self, guest: Guest) -> Result<Guest, StoreError> {
        let _guard = self.lock.lock().await;
        let mut guests = self.read_all().await?;
        if guests.iter().any(|g| g.id == guest.id) {
            return Err(StoreError::DuplicateId(guest.id));
        }
        guests.push(guest.clone());
        self.write_all(&guests).await?;
        Ok(guest)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.into_iter().find(|g| g.id == id))
    }

    async fn update(&self, id: Uuid, update: GuestUpdate) -> Result<Guest, StoreError> {
        let _guard = self.lock.lock().await;
        let mut guests = self.read_all().await?;
        let guest = guests
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::NotFound(id))?;
        guest.apply(&update);
        let updated = guest.clone();
        self.write_all(&guests).await?;
        Ok(updated)
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: GuestStatus,
        update: GuestUpdate,
    ) -> Result<Option<Guest>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut guests = self.read_all().await?;
        let guest = guests
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !matches_decision(guest, expected) {
            return Ok(None);
        }
        guest.apply(&update);
        let updated = guest.clone();
        self.write_all(&guests).await?;
        Ok(Some(updated))
    }

    async fn mark_used_if_unused(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Guest>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut guests = self.read_all().await?;
        let guest = guests
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !is_admissible(guest) {
            return Ok(None);
        }
        guest.apply(&GuestUpdate::check_in(at));
        let updated = guest.clone();
        self.write_all(&guests).await?;
        Ok(Some(updated))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guest(name: &str) -> Guest {
        Guest::new_pending(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
            None,
            Utc::now(),
        )
    }

    fn store_in(dir: &TempDir) -> JsonFileGuestStore {
        JsonFileGuestStore::new(dir.path().join("guests.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_empty_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "\n").unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(
            store.list().await,
            Err(StoreError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let ana = store_in(&dir).insert(guest("Ana")).await.unwrap();

        let reopened = store_in(&dir);
        let guests = reopened.list().await.unwrap();
        assert_eq!(guests, vec![ana.clone()]);

        let raw = std::fs::read_to_string(reopened.path()).unwrap();
        assert!(raw.contains("\"isUsed\": false"));
        assert!(raw.contains("\"createdAt\""));
        assert!(!dir.path().join("guests.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileGuestStore::new(dir.path().join("data").join("guests.json"));
        store.insert(guest("Ana")).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let ana = guest("Ana");
        store.insert(ana.clone()).await.unwrap();

        let result = store.insert(ana.clone()).await;
        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == ana.id));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_find() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let ana = store.insert(guest("Ana")).await.unwrap();

        let updated = store
            .update(ana.id, GuestUpdate::approve(ana.id))
            .await
            .unwrap();
        assert_eq!(updated.status, GuestStatus::Approved);

        let found = store_in(&dir).find_by_id(ana.id).await.unwrap().unwrap();
        assert_eq!(found.qr_code, Some(ana.id.to_string()));
    }

    #[tokio::test]
    async fn test_update_missing_guest() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let result = store.update(Uuid::new_v4(), GuestUpdate::reject()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_used_if_unused() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let ana = store.insert(guest("Ana")).await.unwrap();

        assert!(store
            .mark_used_if_unused(ana.id, Utc::now())
            .await
            .unwrap()
            .is_none());

        store
            .update(ana.id, GuestUpdate::approve(ana.id))
            .await
            .unwrap();
        let at = Utc::now();
        let checked = store.mark_used_if_unused(ana.id, at).await.unwrap().unwrap();
        assert!(checked.is_used);
        assert_eq!(checked.used_at, Some(at));

        assert!(store
            .mark_used_if_unused(ana.id, Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            store.mark_used_if_unused(Uuid::new_v4(), at).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_if_status_checks_current_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let ana = store.insert(guest("Ana")).await.unwrap();
        store
            .update(ana.id, GuestUpdate::approve(ana.id))
            .await
            .unwrap();
        store.mark_used_if_unused(ana.id, Utc::now()).await.unwrap();

        let result = store
            .update_if_status(ana.id, GuestStatus::Approved, GuestUpdate::reject())
            .await
            .unwrap();
        assert!(result.is_none());

        let stored = store_in(&dir).find_by_id(ana.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GuestStatus::Approved);
        assert_eq!(stored.qr_code, Some(ana.id.to_string()));
    }

    #[tokio::test]
    async fn test_update_if_status_applies_when_matching() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let ana = store.insert(guest("Ana")).await.unwrap();

        let rejected = store
            .update_if_status(ana.id, GuestStatus::Pending, GuestUpdate::reject())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.status, GuestStatus::Rejected);
        assert!(matches!(
            store
                .update_if_status(Uuid::new_v4(), GuestStatus::Pending, GuestUpdate::reject())
                .await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.insert(guest("Ana")).await.unwrap();

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        assert!(store.list().await.unwrap().is_empty());

        // Clearing an absent file is fine.
        store.clear().await.unwrap();
    }
}
