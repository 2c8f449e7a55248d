//! Domain models for the guest list.

pub mod guest;
pub mod scan;

pub use guest::{Guest, GuestStats, GuestStatus, GuestUpdate, RegisterGuestRequest};
pub use scan::{ScanOutcome, ScanResult};
