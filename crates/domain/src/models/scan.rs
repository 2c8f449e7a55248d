//! Door scan outcomes.

use serde::{Deserialize, Serialize};

use super::guest::Guest;

/// Severity of a scan outcome, used by the scanner UI for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcome {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanOutcome::Success => write!(f, "success"),
            ScanOutcome::Warning => write!(f, "warning"),
            ScanOutcome::Error => write!(f, "error"),
        }
    }
}

/// Result of validating a scanned QR payload.
///
/// Rejected scans are ordinary results, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub valid: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub outcome: ScanOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<Guest>,
}

impl ScanResult {
    pub fn invalid_qr() -> Self {
        Self {
            valid: false,
            message: "invalid QR".to_string(),
            outcome: ScanOutcome::Error,
            guest: None,
        }
    }

    pub fn not_approved() -> Self {
        Self {
            valid: false,
            message: "access denied, not approved".to_string(),
            outcome: ScanOutcome::Error,
            guest: None,
        }
    }

    /// The ticket was already used; the guest is returned so the door can see who entered.
    pub fn already_used(guest: Guest) -> Self {
        let message = match guest.used_at {
            Some(at) => format!("already used at {}", at.format("%H:%M:%S UTC")),
            None => "already used".to_string(),
        };
        Self {
            valid: false,
            message,
            outcome: ScanOutcome::Warning,
            guest: Some(guest),
        }
    }

    pub fn granted(guest: Guest) -> Self {
        Self {
            valid: true,
            message: "access granted".to_string(),
            outcome: ScanOutcome::Success,
            guest: Some(guest),
        }
    }

    /// The guest was admissible but the check-in could not be persisted.
    pub fn not_recorded() -> Self {
        Self {
            valid: false,
            message: "check-in could not be recorded".to_string(),
            outcome: ScanOutcome::Error,
            guest: None,
        }
    }
}
