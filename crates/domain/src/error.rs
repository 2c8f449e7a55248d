//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::models::GuestStatus;

/// Errors raised by `GuestStore` implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Guest {0} already exists")]
    DuplicateId(Uuid),

    #[error("Guest {0} not found")]
    NotFound(Uuid),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Errors returned by the guest services.
#[derive(Debug, Error)]
pub enum GuestError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Guest {0} not found")]
    NotFound(Uuid),

    #[error("Guest {0} already exists")]
    DuplicateId(Uuid),

    #[error("Cannot move guest from {from} to {to}")]
    InvalidTransition { from: GuestStatus, to: GuestStatus },

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl From<StoreError> for GuestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateId(id) => GuestError::DuplicateId(id),
            StoreError::NotFound(id) => GuestError::NotFound(id),
            StoreError::Storage(msg) => GuestError::StorageFailure(msg),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(format!("Serialization error: {}", err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(format!("I/O error: {}", err))
    }
}
