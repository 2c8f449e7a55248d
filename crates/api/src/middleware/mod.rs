//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod trace_id;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use rate_limit::{registration_rate_limit, RegistrationRateLimiter};
pub use trace_id::{trace_id, REQUEST_ID_HEADER};
