//! Domain services for the guest list.
//!
//! Services contain business logic that operates on domain models through a
//! `GuestStore`.

pub mod approval;
pub mod check_in;
pub mod guest_locks;
pub mod notification;
pub mod registration;
pub mod roster;

pub use approval::{ApprovalService, ApprovalSettings};
pub use check_in::{CheckInService, ScanSerialization};
pub use guest_locks::GuestLocks;
pub use notification::{
    ApprovalNotification, LogNotificationGateway, NotificationGateway, NotificationResult,
};
pub use registration::RegistrationService;
pub use roster::RosterService;
