//! Persistence layer for the guest list backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - `GuestStore` backends: PostgreSQL repository and JSON file

pub mod db;
pub mod entities;
pub mod json_store;
pub mod metrics;
pub mod repositories;

pub use json_store::JsonFileGuestStore;
pub use repositories::GuestRepository;
