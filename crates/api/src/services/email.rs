//! Email delivery of approval notifications.
//!
//! Supports two providers:
//! - `console`: Logs emails to console (development)
//! - `sendgrid`: Uses the SendGrid v3 API

use async_trait::async_trait;
use domain::services::{ApprovalNotification, NotificationGateway, NotificationResult};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EmailConfig;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Sends the "you're on the list" email when a guest is approved.
#[derive(Clone)]
pub struct EmailNotificationGateway {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailNotificationGateway {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Link to the attendee ticket page, when a base URL is configured.
    fn ticket_url(&self, qr_payload: &str) -> Option<String> {
        let base = self.config.ticket_base_url.trim_end_matches('/');
        (!base.is_empty()).then(|| format!("{}/ticket/{}", base, qr_payload))
    }

    /// Render the approval email for one guest.
    pub fn render_approval(&self, notification: &ApprovalNotification) -> EmailMessage {
        let ticket_line = self
            .ticket_url(&notification.qr_payload)
            .map(|url| format!("\nYour ticket: {}\n", url))
            .unwrap_or_default();

        let body_text = format!(
            r#"Hi {name},

You're on the list for {event}.

Show this code at the door:

{code}
{ticket}
The code admits one person, once.

See you there!"#,
            name = notification.to_name,
            event = notification.event_label,
            code = notification.qr_payload,
            ticket = ticket_line,
        );

        let body_html = (self.config.template_style == "html").then(|| {
            let ticket_html = self
                .ticket_url(&notification.qr_payload)
                .map(|url| format!(r#"<p><a href="{url}">Open your ticket</a></p>"#))
                .unwrap_or_default();
            format!(
                r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>You're on the list</title></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>You're on the list</h2>
    <p>Hi {name},</p>
    <p>Your registration for <strong>{event}</strong> has been approved.</p>
    <p>Show this code at the door:</p>
    <p style="font-family: monospace; font-size: 18px; background: #f4f4f4; padding: 12px; border-radius: 6px;">{code}</p>
    {ticket}
    <p style="color: #666; font-size: 14px;">The code admits one person, once.</p>
</body>
</html>"#,
                name = notification.to_name,
                event = notification.event_label,
                code = notification.qr_payload,
                ticket = ticket_html,
            )
        });

        EmailMessage {
            to: notification.to_email.clone(),
            to_name: notification.to_name.clone(),
            subject: format!("You're on the list - {}", notification.event_label),
            body_text,
            body_html,
        }
    }

    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => {
                self.send_console(&message);
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(&message).await,
            _ => Err(EmailError::NotConfigured),
        }
    }

    /// Console provider - logs emails for development.
    fn send_console(&self, message: &EmailMessage) {
        info!(
            to = %message.to,
            to_name = %message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body (plain text)");
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let mut content = vec![serde_json::json!({
            "type": "text/plain",
            "value": message.body_text
        })];
        if let Some(html) = &message.body_html {
            content.push(serde_json::json!({
                "type": "text/html",
                "value": html
            }));
        }

        let body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to, "name": message.to_name }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": content
        });

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, detail
            )))
        }
    }
}

#[async_trait]
impl NotificationGateway for EmailNotificationGateway {
    async fn send_approval(&self, notification: &ApprovalNotification) -> NotificationResult {
        if !self.is_enabled() {
            debug!(to = %notification.to_email, "Email service disabled, skipping send");
            return NotificationResult::Skipped;
        }

        match self.send(self.render_approval(notification)).await {
            Ok(()) => NotificationResult::Sent,
            Err(err) => NotificationResult::Failed(err.to_string()),
        }
    }
}
