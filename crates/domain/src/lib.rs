//! Domain layer for the guest list backend.
//!
//! This crate contains:
//! - The guest model and scan outcomes
//! - The `GuestStore` abstraction and an in-memory implementation
//! - Registration, approval, check-in and roster services
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{GuestError, StoreError};
pub use store::{GuestStore, InMemoryGuestStore};
