//! # Saga Steps
//!
//! A saga step is an idempotent decision point that an external poller
//! re-invokes until it reports [`CompletionResult::Completed`].

pub mod final_step;
pub mod ledger;
pub mod locks;
pub mod variables;

use crate::error::Result;
use crate::models::{CompletionResult, ExternalTask};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use final_step::FinalStepOrchestrator;
pub use ledger::{FileNotificationLedger, InMemoryNotificationLedger, NotificationLedger};
pub use locks::InstanceLocks;

/// Trait implemented by every poll-driven saga step
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Evaluate the step for `task` under `process_name`.
    ///
    /// * `Ok(Pending)` - not done yet, invoke again on a later poll
    /// * `Ok(Completed)` - done; the poller may complete the external task
    /// * `Err` - the invocation failed; nothing was reported as complete
    async fn finish_process(
        &self,
        process_name: &str,
        task: &ExternalTask,
        cancel: &CancellationToken,
    ) -> Result<CompletionResult>;

    /// Get the step name for identification in logs
    fn step_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
