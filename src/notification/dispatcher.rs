//! # Notification Dispatcher
//!
//! Sends a composed message through the configured channel exactly once per
//! call. There is no retry here; the poller decides what happens next.

use super::NotificationChannel;
use crate::error::{Result, SagaError};
use crate::models::NotificationMessage;
use std::sync::Arc;
use tracing::{info, warn};

pub struct NotificationDispatcher {
    channel: Arc<dyn NotificationChannel>,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    pub async fn send(&self, message: &NotificationMessage) -> Result<()> {
        let channel = self.channel.channel_name();

        match self.channel.deliver(message).await {
            Ok(()) => {
                info!(channel = channel, recipient = %message.recipient, "Notification dispatched");
                Ok(())
            }
            Err(error) => {
                warn!(
                    channel = channel,
                    recipient = %message.recipient,
                    error = %error,
                    "Notification dispatch failed"
                );
                Err(match error {
                    SagaError::DeliveryFailed { .. }
                    | SagaError::Timeout { .. }
                    | SagaError::Cancelled { .. } => error,
                    other => SagaError::delivery_failed(&message.recipient, other),
                })
            }
        }
    }
}
