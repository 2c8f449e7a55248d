//! Notification gateway for approval messages.
//!
//! Provides the abstraction the approval flow uses to tell a guest they are in.

use serde::{Deserialize, Serialize};

/// Message sent to a guest once their registration is approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalNotification {
    pub to_email: String,
    pub to_name: String,
    /// Value encoded in the guest's QR code.
    pub qr_payload: String,
    /// Event name and date shown in the message.
    pub event_label: String,
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationResult {
    /// Notification was handed to the provider.
    Sent,
    /// Notification sending failed (but was non-blocking).
    Failed(String),
    /// Notification was skipped (e.g., delivery disabled).
    Skipped,
}

/// Outbound channel for approval messages (email, SMS, ...).
///
/// Implementations report failures through `NotificationResult` and never
/// return an error, so a failed delivery cannot undo a committed approval.
#[async_trait::async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_approval(&self, notification: &ApprovalNotification) -> NotificationResult;
}

/// Logging notification gateway for development and testing.
///
/// Logs notifications but doesn't actually send them.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationGateway {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
}

impl LogNotificationGateway {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    /// Create a gateway that fails every send.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl NotificationGateway for LogNotificationGateway {
    async fn send_approval(&self, notification: &ApprovalNotification) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                to_email = %notification.to_email,
                "Log notification gateway simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            to_email = %notification.to_email,
            to_name = %notification.to_name,
            qr_payload = %notification.qr_payload,
            event_label = %notification.event_label,
            "Would send approval notification"
        );

        NotificationResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> ApprovalNotification {
        ApprovalNotification {
            to_email: "ana@x.com".to_string(),
            to_name: "Ana".to_string(),
            qr_payload: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            event_label: "New Year's Eve - 31 Dec 2025".to_string(),
        }
    }

    #[test]
    fn test_approval_notification_serialization() {
        let json = serde_json::to_string(&notification()).unwrap();
        assert!(json.contains("\"toEmail\":\"ana@x.com\""));
        assert!(json.contains("\"qrPayload\""));
        assert!(json.contains("\"eventLabel\""));
    }

    #[tokio::test]
    async fn test_log_gateway_send() {
        let gateway = LogNotificationGateway::new();
        let result = gateway.send_approval(&notification()).await;
        assert_eq!(result, NotificationResult::Sent);
    }

    #[tokio::test]
    async fn test_log_gateway_failure() {
        let gateway = LogNotificationGateway::failing();
        let result = gateway.send_approval(&notification()).await;
        assert!(matches!(result, NotificationResult::Failed(_)));
    }
}
