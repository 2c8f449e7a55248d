use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    ApprovalService, CheckInService, GuestLocks, NotificationGateway, RegistrationService,
    RosterService,
};
use domain::GuestStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, registration_rate_limit, trace_id,
    RegistrationRateLimiter,
};
use crate::routes::{guests, health};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present only for the postgres backend; used by probes and pool metrics.
    pub pool: Option<PgPool>,
    pub registration: RegistrationService,
    pub approval: ApprovalService,
    pub check_in: Arc<CheckInService>,
    pub roster: RosterService,
    pub registration_limiter: Option<Arc<RegistrationRateLimiter>>,
}

impl AppState {
    /// Wire the guest services over one store and one notification gateway.
    pub fn new(
        config: Config,
        store: Arc<dyn GuestStore>,
        notifier: Arc<dyn NotificationGateway>,
        pool: Option<PgPool>,
    ) -> Self {
        let registration_limiter =
            RegistrationRateLimiter::new(config.security.registration_rate_limit_per_minute)
                .map(Arc::new);
        // Decisions and scans of one guest serialize on the same lock.
        let guest_locks = Arc::new(GuestLocks::new());

        Self {
            registration: RegistrationService::new(store.clone()),
            approval: ApprovalService::new(
                store.clone(),
                notifier,
                config.event.approval_settings(),
            )
            .with_locks(guest_locks.clone()),
            check_in: Arc::new(
                CheckInService::new(store.clone(), config.event.scan_serialization)
                    .with_locks(guest_locks),
            ),
            roster: RosterService::new(store),
            registration_limiter,
            pool,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Guest routes (v1). No authentication: the UI collaborator owns access control.
    let guest_routes = Router::new()
        .route(
            "/api/v1/guests",
            post(guests::register_guest)
                .get(guests::list_guests)
                .delete(guests::clear_guests),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            registration_rate_limit,
        ))
        .route("/api/v1/guests/stats", get(guests::guest_stats))
        .route("/api/v1/guests/:guest_id", get(guests::get_guest))
        .route(
            "/api/v1/guests/:guest_id/approve",
            post(guests::approve_guest),
        )
        .route("/api/v1/guests/:guest_id/reject", post(guests::reject_guest))
        .route("/api/v1/check-in", post(guests::check_in));

    // Public operational routes
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(guest_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
