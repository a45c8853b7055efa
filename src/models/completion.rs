//! Outcome of one saga step invocation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `Pending` means the caller must invoke the step again later; `Completed`
/// means the instance is finished and its notification has been handled.
///
/// Failures are not a third outcome: they travel as `Err(SagaError)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionResult {
    Pending,
    Completed,
}

impl CompletionResult {
    pub fn is_completed(self) -> bool {
        matches!(self, CompletionResult::Completed)
    }
}

impl From<CompletionResult> for bool {
    fn from(result: CompletionResult) -> Self {
        result.is_completed()
    }
}

impl fmt::Display for CompletionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionResult::Pending => write!(f, "pending"),
            CompletionResult::Completed => write!(f, "completed"),
        }
    }
}
