//! Guest registration.

use std::sync::Arc;

use chrono::Utc;
use shared::validation::{normalize_handle, normalize_required};
use tracing::info;

use crate::error::GuestError;
use crate::models::Guest;
use crate::store::GuestStore;

/// Creates pending guest records from the public registration form.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn GuestStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn GuestStore>) -> Self {
        Self { store }
    }

    /// Register a new guest in the `pending` state.
    ///
    /// `name` and `email` are required. The same email may register more than once.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        instagram: Option<&str>,
    ) -> Result<Guest, GuestError> {
        let name = normalize_required(name)
            .ok_or_else(|| GuestError::InvalidInput("name is required".to_string()))?;
        let email = normalize_required(email)
            .ok_or_else(|| GuestError::InvalidInput("email is required".to_string()))?;
        let instagram = normalize_handle(instagram);

        let guest = Guest::new_pending(name, email, instagram, Utc::now());
        let guest = self.store.insert(guest).await?;

        info!(
            guest_id = %guest.id,
            email = %guest.email,
            "Guest registered"
        );

        Ok(guest)
    }
}
