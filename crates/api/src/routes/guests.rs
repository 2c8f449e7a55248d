//! Guest list endpoint handlers.
//!
//! Registration and the attendee status poll are used by the public pages;
//! everything else backs the admin dashboard and the door scanner.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{Guest, GuestStats, GuestStatus, RegisterGuestRequest, ScanResult};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{
    record_check_in_scan, record_guest_approved, record_guest_registered,
};

/// Query parameters for listing guests.
#[derive(Debug, Deserialize)]
pub struct ListGuestsQuery {
    pub status: Option<String>,
}

/// Body posted by the door scanner.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub payload: String,
}

/// Register a guest from the public form.
///
/// POST /api/v1/guests
pub async fn register_guest(
    State(state): State<AppState>,
    Json(request): Json<RegisterGuestRequest>,
) -> Result<(StatusCode, Json<Guest>), ApiError> {
    request.validate()?;

    let guest = state
        .registration
        .register(&request.name, &request.email, request.instagram.as_deref())
        .await?;
    record_guest_registered();

    Ok((StatusCode::CREATED, Json(guest)))
}

/// List guests newest first, optionally filtered by status.
///
/// GET /api/v1/guests?status=pending
pub async fn list_guests(
    State(state): State<AppState>,
    Query(query): Query<ListGuestsQuery>,
) -> Result<Json<Vec<Guest>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<GuestStatus>())
        .transpose()
        .map_err(ApiError::Validation)?;

    Ok(Json(state.roster.list(status).await?))
}

/// Headcount totals for the dashboard.
///
/// GET /api/v1/guests/stats
pub async fn guest_stats(State(state): State<AppState>) -> Result<Json<GuestStats>, ApiError> {
    Ok(Json(state.roster.stats().await?))
}

/// Single guest, polled by the attendee page while awaiting a decision.
///
/// GET /api/v1/guests/:guest_id
pub async fn get_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<Uuid>,
) -> Result<Json<Guest>, ApiError> {
    Ok(Json(state.roster.get(guest_id).await?))
}

/// POST /api/v1/guests/:guest_id/approve
pub async fn approve_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<Uuid>,
) -> Result<Json<Guest>, ApiError> {
    let guest = state.approval.approve(guest_id).await?;
    record_guest_approved();
    Ok(Json(guest))
}

/// POST /api/v1/guests/:guest_id/reject
pub async fn reject_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.approval.reject(guest_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every guest.
///
/// DELETE /api/v1/guests
pub async fn clear_guests(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.roster.reset().await?;
    warn!("Guest list cleared via API");
    Ok(StatusCode::NO_CONTENT)
}

/// Validate a scanned QR payload.
///
/// Denied scans are still 200 responses; the body says why.
///
/// POST /api/v1/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<ScanResult>, ApiError> {
    let result = state.check_in.scan(&request.payload).await?;
    record_check_in_scan(result.outcome);
    Ok(Json(result))
}
