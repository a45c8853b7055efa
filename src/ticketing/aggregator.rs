//! # Attachment Aggregator

use super::TicketingSystem;
use crate::error::{Result, SagaError};
use crate::models::Attachment;
use std::sync::Arc;
use tracing::debug;

/// Collects the attachment locators of a card, preserving ticketing order
pub struct AttachmentAggregator {
    ticketing: Arc<dyn TicketingSystem>,
}

impl AttachmentAggregator {
    pub fn new(ticketing: Arc<dyn TicketingSystem>) -> Self {
        Self { ticketing }
    }

    pub async fn attachments(&self, card_id: &str) -> Result<Vec<Attachment>> {
        let attachments = self
            .ticketing
            .card_attachments(card_id)
            .await
            .map_err(|error| match error {
                SagaError::AttachmentFetchFailed { .. }
                | SagaError::Timeout { .. }
                | SagaError::Cancelled { .. } => error,
                other => SagaError::attachment_fetch_failed(card_id, other),
            })?;

        debug!(card_id = %card_id, count = attachments.len(), "Aggregated card attachments");
        Ok(attachments)
    }
}
