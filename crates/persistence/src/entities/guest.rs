//! Guest entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Guest, GuestStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for guest review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "guest_status", rename_all = "lowercase")]
pub enum GuestStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<GuestStatusDb> for GuestStatus {
    fn from(status: GuestStatusDb) -> Self {
        match status {
            GuestStatusDb::Pending => GuestStatus::Pending,
            GuestStatusDb::Approved => GuestStatus::Approved,
            GuestStatusDb::Rejected => GuestStatus::Rejected,
        }
    }
}

impl From<GuestStatus> for GuestStatusDb {
    fn from(status: GuestStatus) -> Self {
        match status {
            GuestStatus::Pending => GuestStatusDb::Pending,
            GuestStatus::Approved => GuestStatusDb::Approved,
            GuestStatus::Rejected => GuestStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the guests table.
#[derive(Debug, Clone, FromRow)]
pub struct GuestEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub instagram: Option<String>,
    pub status: GuestStatusDb,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub qr_code: Option<String>,
}

impl From<GuestEntity> for Guest {
    fn from(entity: GuestEntity) -> Self {
        Guest {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            instagram: entity.instagram,
            status: entity.status.into(),
            is_used: entity.is_used,
            used_at: entity.used_at,
            created_at: entity.created_at,
            qr_code: entity.qr_code,
        }
    }
}
