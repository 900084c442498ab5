//! Outbound shopper notifications.
//!
//! Rendering and dispatch are delegated to a mail collaborator reached over
//! HTTP; this service validates the request, picks the template for the
//! notification kind, and returns the provider's message id.

use crate::errors::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument};
use utoipa::ToSchema;

/// The enumerated notification templates the storefront can send.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EmailKind {
    Welcome,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
}

/// A fully rendered outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// The mail provider seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatches a message, returning the provider message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, ServiceError>;
}

/// HTTP mail provider client.
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MailerResponseWire {
    id: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": message.from,
                "to": message.to,
                "subject": message.subject,
                "text": message.body,
            }))
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("mail provider unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "mail provider returned {}: {}",
                status, body
            )));
        }

        let wire: MailerResponseWire = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid mail provider response: {}", e))
        })?;

        Ok(wire.id)
    }
}

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, from: String) -> Self {
        Self { mailer, from }
    }

    /// Sends one notification and returns the provider message id.
    #[instrument(skip(self, data))]
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        kind: EmailKind,
        data: &Value,
    ) -> Result<String, ServiceError> {
        if to.trim().is_empty() || subject.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "missing required fields: to, subject".to_string(),
            ));
        }

        let message = EmailMessage {
            to: to.to_string(),
            from: self.from.clone(),
            subject: subject.to_string(),
            body: render_body(kind, data),
        };

        let message_id = self.mailer.send(&message).await?;
        info!(message_id = %message_id, to = %to, "notification sent");
        Ok(message_id)
    }
}

fn field<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Plain-text template per notification kind. The provider renders its own
/// HTML around this; the storefront only supplies the facts.
fn render_body(kind: EmailKind, data: &Value) -> String {
    let name = field(data, "customerName");
    match kind {
        EmailKind::Welcome => format!(
            "Hi {},\n\nWelcome to the store. Your account is ready — happy browsing!",
            name
        ),
        EmailKind::OrderShipped => format!(
            "Hi {},\n\nYour order {} is on its way.\nTracking number: {}",
            name,
            field(data, "orderId"),
            field(data, "trackingNumber"),
        ),
        EmailKind::OrderDelivered => format!(
            "Hi {},\n\nYour order {} has been delivered. We hope you love it!",
            name,
            field(data, "orderId"),
        ),
        EmailKind::OrderCancelled => format!(
            "Hi {},\n\nYour order {} has been cancelled.\nReason: {}",
            name,
            field(data, "orderId"),
            field(data, "reason"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<String, ServiceError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok("msg-001".to_string())
        }
    }

    fn service() -> (NotificationService, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
        });
        (
            NotificationService::new(mailer.clone(), "orders@store.example".to_string()),
            mailer,
        )
    }

    #[test]
    fn kind_wire_format_matches_api_contract() {
        assert_eq!(
            serde_json::to_string(&EmailKind::OrderShipped).unwrap(),
            "\"orderShipped\""
        );
        let parsed: EmailKind = serde_json::from_str("\"orderCancelled\"").unwrap();
        assert_eq!(parsed, EmailKind::OrderCancelled);

        assert!(serde_json::from_str::<EmailKind>("\"promotional\"").is_err());
    }

    #[tokio::test]
    async fn send_returns_provider_message_id() {
        let (service, mailer) = service();
        let data = serde_json::json!({
            "customerName": "Asha",
            "orderId": "ORD-AB12CD34",
            "trackingNumber": "TRK-1"
        });

        let id = service
            .send("asha@example.com", "Your order shipped", EmailKind::OrderShipped, &data)
            .await
            .unwrap();

        assert_eq!(id, "msg-001");
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("ORD-AB12CD34"));
        assert!(sent[0].body.contains("TRK-1"));
    }

    #[tokio::test]
    async fn send_rejects_blank_recipient() {
        let (service, _) = service();
        let err = service
            .send("  ", "subject", EmailKind::Welcome, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
