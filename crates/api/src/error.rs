use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::GuestError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited {
        limit_per_minute: u32,
        retry_after: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::RateLimited {
                limit_per_minute, ..
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                format!(
                    "Rate limit of {} registrations/minute exceeded",
                    limit_per_minute
                ),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let retry_after = match &self {
            ApiError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        };
        let body = ErrorBody {
            error: error_code.into(),
            message,
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<GuestError> for ApiError {
    fn from(err: GuestError) -> Self {
        match err {
            GuestError::InvalidInput(msg) => ApiError::Validation(msg),
            GuestError::NotFound(id) => ApiError::NotFound(format!("Guest {} not found", id)),
            GuestError::DuplicateId(id) => {
                ApiError::Conflict(format!("Guest {} already exists", id))
            }
            err @ GuestError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            GuestError::StorageFailure(msg) => ApiError::Internal(format!("Storage error: {}", msg)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect();
        details.sort();

        let message = if details.len() == 1 {
            details.remove(0)
        } else {
            format!("{} validation errors: {}", details.len(), details.join(", "))
        };

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::GuestStatus;
    use uuid::Uuid;
    use validator::Validate;

    #[test]
    fn test_api_error_not_found() {
        let response = ApiError::NotFound("resource not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_conflict() {
        let response = ApiError::Conflict("already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_api_error_validation() {
        let response = ApiError::Validation("invalid input".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_rate_limited() {
        let response = ApiError::RateLimited {
            limit_per_minute: 30,
            retry_after: 60,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }

    #[test]
    fn test_retry_after_only_on_rate_limit() {
        let response = ApiError::Conflict("taken".to_string()).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_api_error_internal() {
        let response = ApiError::Internal("disk full".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_service_unavailable() {
        let response = ApiError::ServiceUnavailable("store down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_from_guest_error() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ApiError::from(GuestError::InvalidInput("name is required".into())),
            ApiError::Validation(msg) if msg == "name is required"
        ));
        assert!(matches!(
            ApiError::from(GuestError::NotFound(id)),
            ApiError::NotFound(msg) if msg.contains(&id.to_string())
        ));
        assert!(matches!(
            ApiError::from(GuestError::DuplicateId(id)),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(GuestError::InvalidTransition {
                from: GuestStatus::Rejected,
                to: GuestStatus::Approved,
            }),
            ApiError::Conflict(msg) if msg.contains("rejected")
        ));
        assert!(matches!(
            ApiError::from(GuestError::StorageFailure("io".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_from_validation_errors() {
        let request = domain::models::RegisterGuestRequest {
            name: " ".to_string(),
            email: String::new(),
            instagram: None,
        };
        let errors = request.validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::Validation(msg) => {
                assert!(msg.starts_with("2 validation errors"));
                assert!(msg.contains("email"));
                assert!(msg.contains("name"));
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
