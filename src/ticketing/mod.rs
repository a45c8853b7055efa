//! # Ticketing System Boundary
//!
//! The saga's supporting documents live as attachments on a ticketing card.

pub mod aggregator;
pub mod trello;

use crate::error::Result;
use crate::models::Attachment;
use async_trait::async_trait;

pub use aggregator::AttachmentAggregator;
pub use trello::TrelloClient;

#[async_trait]
pub trait TicketingSystem: Send + Sync {
    /// Attachments of `card_id` in the order the ticketing system returns them.
    ///
    /// An empty list is a valid answer. Transport failures are
    /// [`SagaError::AttachmentFetchFailed`](crate::error::SagaError::AttachmentFetchFailed).
    async fn card_attachments(&self, card_id: &str) -> Result<Vec<Attachment>>;
}
