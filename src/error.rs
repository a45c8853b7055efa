//! Error types for saga steps.
//!
//! A step invocation either returns a [`CompletionResult`](crate::models::CompletionResult)
//! or fails with one of these errors. "Still pending" is never an error.

use crate::config::ConfigurationError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SagaError {
    #[error("Workflow engine unavailable while {operation}: {reason}")]
    EngineUnavailable { operation: String, reason: String },

    #[error("Process variable '{name}' is missing on external task {external_task_id}")]
    MissingVariable {
        name: String,
        external_task_id: String,
    },

    #[error("Process variable '{name}' on external task {external_task_id} is not a scalar: {found}")]
    InvalidVariable {
        name: String,
        external_task_id: String,
        found: String,
    },

    #[error("Failed to fetch attachments for card {card_id}: {reason}")]
    AttachmentFetchFailed { card_id: String, reason: String },

    #[error("Notification delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },

    #[error("Notification ledger error: {0}")]
    Ledger(String),

    #[error("Timeout error for operation {operation}: {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Operation {operation} was cancelled")]
    Cancelled { operation: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl SagaError {
    pub fn engine_unavailable(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::EngineUnavailable {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn attachment_fetch_failed(card_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::AttachmentFetchFailed {
            card_id: card_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn delivery_failed(recipient: impl Into<String>, reason: impl ToString) -> Self {
        Self::DeliveryFailed {
            recipient: recipient.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether re-invoking the step on the next poll can succeed without
    /// anyone fixing the process definition or the configuration.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SagaError::MissingVariable { .. }
                | SagaError::InvalidVariable { .. }
                | SagaError::Configuration(_)
        )
    }

    /// Stable code used in structured log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            SagaError::EngineUnavailable { .. } => "ENGINE_UNAVAILABLE",
            SagaError::MissingVariable { .. } => "MISSING_VARIABLE",
            SagaError::InvalidVariable { .. } => "INVALID_VARIABLE",
            SagaError::AttachmentFetchFailed { .. } => "ATTACHMENT_FETCH_FAILED",
            SagaError::DeliveryFailed { .. } => "DELIVERY_FAILED",
            SagaError::Ledger(_) => "LEDGER_ERROR",
            SagaError::Timeout { .. } => "TIMEOUT",
            SagaError::Cancelled { .. } => "CANCELLED",
            SagaError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for SagaError {
    fn from(error: serde_json::Error) -> Self {
        SagaError::Ledger(format!("JSON serialization error: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_defects_are_not_retryable() {
        let missing = SagaError::MissingVariable {
            name: "cardId".to_string(),
            external_task_id: "t-1".to_string(),
        };
        assert!(!missing.is_retryable());
        assert_eq!(missing.error_code(), "MISSING_VARIABLE");

        let config = SagaError::from(ConfigurationError::missing_setting("EmailSecretaria", "Email"));
        assert!(!config.is_retryable());
    }

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(SagaError::engine_unavailable("querying subtasks", "connection refused").is_retryable());
        assert!(SagaError::attachment_fetch_failed("card-1", "502").is_retryable());
        assert!(SagaError::delivery_failed("sec@example.org", "rejected").is_retryable());
        assert!(SagaError::Timeout {
            operation: "dispatch".to_string(),
            timeout: Duration::from_secs(1),
        }
        .is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = SagaError::attachment_fetch_failed("card-9", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "Failed to fetch attachments for card card-9: HTTP 503"
        );
    }
}
