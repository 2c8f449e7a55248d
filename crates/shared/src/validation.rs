//! Common validation utilities.
//!
//! Registration only enforces required fields. Anything stricter (email
//! syntax, handle format) is left to the client form.

use validator::ValidationError;

/// Validates that a required text field is not empty or whitespace only.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Trims a required field, returning `None` when nothing is left.
pub fn normalize_required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes an optional social handle.
///
/// Surrounding whitespace and a single leading `@` are removed. A blank
/// handle becomes `None`.
pub fn normalize_handle(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}
