//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod guest;

pub use guest::{GuestEntity, GuestStatusDb};
