//! Repository implementations for database operations.

pub mod guest;

pub use guest::GuestRepository;
