//! Guest repository for the `postgres` storage backend.

use chrono::{DateTime, Utc};
use domain::models::{Guest, GuestStatus, GuestUpdate};
use domain::{GuestStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GuestEntity, GuestStatusDb};
use crate::metrics::QueryTimer;

const BACKEND: &str = "postgres";

const GUEST_COLUMNS: &str =
    "id, name, email, instagram, status, is_used, used_at, created_at, qr_code";

/// Field patch shared by `update` and `update_if_status`.
const PATCH_SET: &str = r#"
    status = COALESCE($2, status),
    qr_code = CASE WHEN $3 THEN $4 ELSE qr_code END,
    is_used = COALESCE($5, is_used),
    used_at = COALESCE($6, used_at)
"#;

/// Postgres unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Repository for guest-related database operations.
#[derive(Clone)]
pub struct GuestRepository {
    pool: PgPool,
}

impl GuestRepository {
    /// Creates a new GuestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new(BACKEND, "guest_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM guests WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A conditional write matched no row: `None` if the guest exists, else `NotFound`.
    async fn unmatched(&self, id: Uuid) -> Result<Option<Guest>, StoreError> {
        if self.exists(id).await.map_err(storage_error)? {
            Ok(None)
        } else {
            Err(StoreError::NotFound(id))
        }
    }
}

fn storage_error(err: sqlx::Error) -> StoreError {
    StoreError::Storage(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait::async_trait]
impl GuestStore for GuestRepository {
    async fn list(&self) -> Result<Vec<Guest>, StoreError> {
        let timer = QueryTimer::new(BACKEND, "list_guests");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(storage_error)?
            .into_iter()
            .map(Guest::from)
            .collect())
    }

    async fn insert(&self, guest: Guest) -> Result<Guest, StoreError> {
        let timer = QueryTimer::new(BACKEND, "insert_guest");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            r#"
            INSERT INTO guests (id, name, email, instagram, status, is_used, used_at, created_at, qr_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {GUEST_COLUMNS}
            "#
        ))
        .bind(guest.id)
        .bind(&guest.name)
        .bind(&guest.email)
        .bind(&guest.instagram)
        .bind(GuestStatusDb::from(guest.status))
        .bind(guest.is_used)
        .bind(guest.used_at)
        .bind(guest.created_at)
        .bind(&guest.qr_code)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        match result {
            Ok(entity) => Ok(entity.into()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateId(guest.id)),
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>, StoreError> {
        let timer = QueryTimer::new(BACKEND, "find_guest_by_id");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(storage_error)?.map(Guest::from))
    }

    async fn update(&self, id: Uuid, update: GuestUpdate) -> Result<Guest, StoreError> {
        let timer = QueryTimer::new(BACKEND, "update_guest");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            "UPDATE guests SET {PATCH_SET} WHERE id = $1 RETURNING {GUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(update.status.map(GuestStatusDb::from))
        .bind(update.qr_code.is_some())
        .bind(update.qr_code.flatten())
        .bind(update.is_used)
        .bind(update.used_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(storage_error)?
            .map(Guest::from)
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: GuestStatus,
        update: GuestUpdate,
    ) -> Result<Option<Guest>, StoreError> {
        let timer = QueryTimer::new(BACKEND, "update_guest_if_status");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            r#"
            UPDATE guests SET {PATCH_SET}
            WHERE id = $1 AND status = $7 AND is_used = FALSE
            RETURNING {GUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.status.map(GuestStatusDb::from))
        .bind(update.qr_code.is_some())
        .bind(update.qr_code.flatten())
        .bind(update.is_used)
        .bind(update.used_at)
        .bind(GuestStatusDb::from(expected))
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(storage_error)? {
            Some(entity) => Ok(Some(entity.into())),
            None => self.unmatched(id).await,
        }
    }

    async fn mark_used_if_unused(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Guest>, StoreError> {
        let timer = QueryTimer::new(BACKEND, "mark_guest_used");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            r#"
            UPDATE guests SET is_used = TRUE, used_at = $2
            WHERE id = $1 AND status = 'approved' AND is_used = FALSE
            RETURNING {GUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(storage_error)? {
            Some(entity) => Ok(Some(entity.into())),
            None => self.unmatched(id).await,
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let timer = QueryTimer::new(BACKEND, "clear_guests");
        let result = sqlx::query("DELETE FROM guests")
            .execute(&self.pool)
            .await;
        timer.record();

        result.map(|_| ()).map_err(storage_error)
    }
}
