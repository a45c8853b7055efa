//! # Completion Notification
//!
//! Composing the secretariat notification and handing it to a pluggable
//! delivery channel.

pub mod channels;
pub mod composer;
pub mod dispatcher;

use crate::error::Result;
use crate::models::NotificationMessage;
use async_trait::async_trait;

pub use channels::{LogChannel, WebhookChannel};
pub use composer::{AttachmentListStyle, NotificationComposer};
pub use dispatcher::NotificationDispatcher;

/// Delivery mechanism for composed notifications.
///
/// Retry and delivery guarantees belong to the channel, not to the saga step.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Hand the message over; rejection or unreachability is
    /// [`SagaError::DeliveryFailed`](crate::error::SagaError::DeliveryFailed).
    async fn deliver(&self, message: &NotificationMessage) -> Result<()>;

    fn channel_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
