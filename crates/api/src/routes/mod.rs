//! HTTP route handlers.

pub mod guests;
pub mod health;
