//! Built-in notification channels.

use super::NotificationChannel;
use crate::error::{Result, SagaError};
use crate::models::NotificationMessage;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Writes notifications to the log only. Meant for development environments.
#[derive(Debug, Default, Clone)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        info!(recipient = %message.recipient, body = %message.body, "Notification (log channel)");
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "log"
    }
}

/// POSTs `{"recipient": ..., "body": ...}` to a mail relay or queue gateway
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("sagas-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SagaError::delivery_failed(&url, e))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| SagaError::delivery_failed(&message.recipient, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(SagaError::delivery_failed(
            &message.recipient,
            format!("{status} - {error_text}"),
        ))
    }

    fn channel_name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_channel_always_accepts() {
        let message = NotificationMessage::new("s@ismai.pt", "corpo");
        assert!(LogChannel.deliver(&message).await.is_ok());
        assert_eq!(LogChannel.channel_name(), "log");
    }

    #[tokio::test]
    async fn test_webhook_unreachable_is_delivery_failure() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let channel = WebhookChannel::new("http://127.0.0.1:9/notify", Duration::from_millis(500)).unwrap();
        let err = channel
            .deliver(&NotificationMessage::new("s@ismai.pt", "corpo"))
            .await
            .unwrap_err();
        assert!(matches!(err, SagaError::DeliveryFailed { .. }));
    }
}
