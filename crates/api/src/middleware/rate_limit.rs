//! Rate limiting for the public registration form.
//!
//! One shared token bucket covers every client; it caps how fast the pending
//! queue can be flooded rather than singling out a caller.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::num::NonZeroU32;
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;

type DirectRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Registration limiter shared across all requests.
pub struct RegistrationRateLimiter {
    limiter: DirectRateLimiter,
    rate_limit_per_minute: u32,
}

impl RegistrationRateLimiter {
    /// Returns `None` when `rate_limit_per_minute` is 0 (limit disabled).
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: GovRateLimiter::direct(Quota::per_minute(per_minute)),
            rate_limit_per_minute,
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Ok if a registration may proceed, or Err with retry-after seconds.
    pub fn check(&self) -> Result<(), u64> {
        self.limiter.check().map_err(|not_until| {
            let wait_time = not_until.wait_time_from(DefaultClock::default().now());
            wait_time.as_secs().max(1)
        })
    }
}

impl std::fmt::Debug for RegistrationRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRateLimiter")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

/// Middleware that throttles `POST` requests on the route it wraps.
pub async fn registration_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    if let Some(limiter) = state.registration_limiter.as_deref() {
        if let Err(retry_after) = limiter.check() {
            warn!(retry_after, "Registration rate limit exceeded");
            return ApiError::RateLimited {
                limit_per_minute: limiter.rate_limit_per_minute(),
                retry_after,
            }
            .into_response();
        }
    }

    next.run(req).await
}
