//! Guest domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Review status of a guest registration.
///
/// Check-in is tracked separately through `Guest::is_used` and is not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuestStatus::Pending => write!(f, "pending"),
            GuestStatus::Approved => write!(f, "approved"),
            GuestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for GuestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(GuestStatus::Pending),
            "approved" => Ok(GuestStatus::Approved),
            "rejected" => Ok(GuestStatus::Rejected),
            other => Err(format!("unknown guest status: {}", other)),
        }
    }
}

/// A registered guest and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    pub status: GuestStatus,
    #[serde(default)]
    pub is_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

impl Guest {
    /// Builds a fresh pending guest with a new random id.
    pub fn new_pending(
        name: String,
        email: String,
        instagram: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            instagram,
            status: GuestStatus::Pending,
            is_used: false,
            used_at: None,
            created_at,
            qr_code: None,
        }
    }

    /// The string a door scanner reads for this guest.
    pub fn qr_payload(&self) -> String {
        self.qr_code.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// Applies a field-level update in place.
    pub fn apply(&mut self, update: &GuestUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(qr_code) = &update.qr_code {
            self.qr_code = qr_code.clone();
        }
        if let Some(is_used) = update.is_used {
            self.is_used = is_used;
        }
        if let Some(used_at) = update.used_at {
            self.used_at = Some(used_at);
        }
    }
}

/// Field-level patch applied by `GuestStore::update`.
///
/// `None` leaves a field untouched. `qr_code: Some(None)` clears the code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuestUpdate {
    pub status: Option<GuestStatus>,
    pub qr_code: Option<Option<String>>,
    pub is_used: Option<bool>,
    pub used_at: Option<DateTime<Utc>>,
}

impl GuestUpdate {
    /// Approval: the QR payload is the guest id itself.
    pub fn approve(id: Uuid) -> Self {
        Self {
            status: Some(GuestStatus::Approved),
            qr_code: Some(Some(id.to_string())),
            ..Default::default()
        }
    }

    pub fn reject() -> Self {
        Self {
            status: Some(GuestStatus::Rejected),
            qr_code: Some(None),
            ..Default::default()
        }
    }

    pub fn check_in(at: DateTime<Utc>) -> Self {
        Self {
            is_used: Some(true),
            used_at: Some(at),
            ..Default::default()
        }
    }
}

/// Registration form payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterGuestRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub email: String,

    pub instagram: Option<String>,
}

/// Headcount summary shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GuestStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub checked_in: usize,
}

impl GuestStats {
    pub fn from_guests(guests: &[Guest]) -> Self {
        guests.iter().fold(Self::default(), |mut stats, guest| {
            stats.total += 1;
            match guest.status {
                GuestStatus::Pending => stats.pending += 1,
                GuestStatus::Approved => stats.approved += 1,
                GuestStatus::Rejected => stats.rejected += 1,
            }
            if guest.is_used {
                stats.checked_in += 1;
            }
            stats
        })
    }
}
