//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::config::StorageBackend;
use crate::error::ApiError;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: StorageHealth,
}

/// Guest store health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageHealth {
    pub backend: StorageBackend,
    pub reachable: bool,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guests: Option<usize>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Read the store once; Some(guest count) if it answered.
async fn probe_storage(state: &AppState) -> Option<usize> {
    if let Some(pool) = &state.pool {
        persistence::metrics::record_pool_metrics(pool);
    }
    state.roster.stats().await.ok().map(|stats| stats.total)
}

/// Full health check endpoint.
///
/// Returns storage reachability and the current guest count.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let guests = probe_storage(&state).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let reachable = guests.is_some();

    let response = HealthResponse {
        status: if reachable { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: StorageHealth {
            backend: state.config.storage.backend,
            reachable,
            latency_ms: reachable.then_some(latency_ms),
            guests,
        },
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the guest store answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    match probe_storage(&state).await {
        Some(_) => Ok(Json(StatusResponse {
            status: "ready".to_string(),
        })),
        None => Err(ApiError::ServiceUnavailable(format!(
            "Guest store ({:?}) is unreachable",
            state.config.storage.backend
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::response::IntoResponse;
    use chrono::{DateTime, Utc};
    use domain::models::{Guest, GuestStatus, GuestUpdate};
    use domain::services::LogNotificationGateway;
    use domain::{GuestStore, StoreError};
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.3.0".to_string(),
            storage: StorageHealth {
                backend: StorageBackend::JsonFile,
                reachable: true,
                latency_ms: Some(2),
                guests: Some(12),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["storage"]["backend"], "json_file");
        assert_eq!(json["storage"]["latency_ms"], 2);
        assert_eq!(json["storage"]["guests"], 12);
    }

    #[test]
    fn test_unreachable_storage_omits_count() {
        let health = StorageHealth {
            backend: StorageBackend::Postgres,
            reachable: false,
            latency_ms: None,
            guests: None,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["reachable"], false);
        assert!(json.get("guests").is_none());
        assert!(json["latency_ms"].is_null());
    }

    #[tokio::test]
    async fn test_live() {
        assert_eq!(live().await.0.status, "alive");
    }

    /// Store that fails every call.
    struct DownStore;

    fn down() -> StoreError {
        StoreError::Storage("connection refused".to_string())
    }

    #[async_trait::async_trait]
    impl GuestStore for DownStore {
        async fn list(&self) -> Result<Vec<Guest>, StoreError> {
            Err(down())
        }
        async fn insert(&self, _guest: Guest) -> Result<Guest, StoreError> {
            Err(down())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Guest>, StoreError> {
            Err(down())
        }
        async fn update(&self, _id: Uuid, _update: GuestUpdate) -> Result<Guest, StoreError> {
            Err(down())
        }
        async fn update_if_status(
            &self,
            _id: Uuid,
            _expected: GuestStatus,
            _update: GuestUpdate,
        ) -> Result<Option<Guest>, StoreError> {
            Err(down())
        }
        async fn mark_used_if_unused(
            &self,
            _id: Uuid,
            _at: DateTime<Utc>,
        ) -> Result<Option<Guest>, StoreError> {
            Err(down())
        }
        async fn clear(&self) -> Result<(), StoreError> {
            Err(down())
        }
    }

    fn down_state() -> AppState {
        let mut config = Config::load_for_test(&[]).unwrap();
        config.storage.backend = StorageBackend::Postgres;
        AppState::new(
            config,
            Arc::new(DownStore),
            Arc::new(LogNotificationGateway::new()),
            None,
        )
    }

    #[tokio::test]
    async fn test_ready_unreachable_store_is_service_unavailable() {
        let response = ready(State(down_state())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "service_unavailable");
        assert!(json["message"].as_str().unwrap().contains("Postgres"));
    }

    #[tokio::test]
    async fn test_health_check_reports_unreachable_store() {
        let (status, Json(health)) = health_check(State(down_state())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.status, "unhealthy");
        assert!(!health.storage.reachable);
        assert!(health.storage.guests.is_none());
    }
}
