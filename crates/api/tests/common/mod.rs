//! Common test utilities for integration tests.
//!
//! The app is driven in-process through `tower::ServiceExt::oneshot` against
//! the in-memory guest store, so no database is needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{
    ApprovalNotification, NotificationGateway, NotificationResult, ScanSerialization,
};
use domain::{GuestStore, InMemoryGuestStore};
use guest_list_api::{
    app::{create_app, AppState},
    config::{
        Config, DatabaseConfig, EmailConfig, EventConfig, LoggingConfig, SecurityConfig,
        ServerConfig, StorageBackend, StorageConfig,
    },
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Test configuration: in-memory store, strict approvals, no rate limit.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            json_path: PathBuf::from("unused.json"),
        },
        database: DatabaseConfig::default(),
        event: EventConfig {
            label: "Winter Party - 25 Dec 2025".to_string(),
            allow_status_override: false,
            scan_serialization: ScanSerialization::PerGuestLock,
        },
        email: EmailConfig::default(),
        security: SecurityConfig {
            cors_origins: vec![],
            registration_rate_limit_per_minute: 0, // Disable rate limiting for tests
        },
    }
}

/// Notification gateway that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<ApprovalNotification>>,
}

impl RecordingGateway {
    pub fn sent(&self) -> Vec<ApprovalNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_approval(&self, notification: &ApprovalNotification) -> NotificationResult {
        self.sent.lock().unwrap().push(notification.clone());
        NotificationResult::Sent
    }
}

/// A running app plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryGuestStore>,
    pub notifier: Arc<RecordingGateway>,
}

impl TestApp {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(InMemoryGuestStore::new());
        let notifier = Arc::new(RecordingGateway::default());
        let router = create_app(AppState::new(
            config,
            store.clone(),
            notifier.clone(),
            None,
        ));
        Self {
            router,
            store,
            notifier,
        }
    }

    /// Send one request and return status plus parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, parse_response_body(response).await)
    }

    /// Number of guests currently in the backing store.
    pub async fn store_len(&self) -> usize {
        self.store.list().await.unwrap().len()
    }

    /// Register a guest through the API and return its JSON.
    pub async fn register(&self, name: &str, email: &str) -> serde_json::Value {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/guests",
                serde_json::json!({ "name": name, "email": email }),
            ))
            .await;
        assert_eq!(status, axum::http::StatusCode::CREATED, "register failed: {body}");
        body
    }

    pub async fn approve(&self, id: &str) -> (axum::http::StatusCode, serde_json::Value) {
        self.send(empty_request(
            Method::POST,
            &format!("/api/v1/guests/{}/approve", id),
        ))
        .await
    }

    pub async fn reject(&self, id: &str) -> (axum::http::StatusCode, serde_json::Value) {
        self.send(empty_request(
            Method::POST,
            &format!("/api/v1/guests/{}/reject", id),
        ))
        .await
    }

    pub async fn scan(&self, payload: &str) -> serde_json::Value {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/check-in",
                serde_json::json!({ "payload": payload }),
            ))
            .await;
        assert_eq!(status, axum::http::StatusCode::OK);
        body
    }
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request without a body.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
