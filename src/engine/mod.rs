//! # Workflow Engine Boundary
//!
//! Traits describing what the saga step needs from the BPM engine, the
//! [`CompletionGate`] built on top of them, and the REST adapter used in
//! deployments.

pub mod camunda;
pub mod completion_gate;

use crate::error::Result;
use crate::models::{ExternalTask, Subtask};
use async_trait::async_trait;
use std::time::Duration;

pub use camunda::CamundaClient;
pub use completion_gate::CompletionGate;

/// Read-only view of the subtasks belonging to a process instance
#[async_trait]
pub trait SubtaskQuery: Send + Sync {
    /// All subtasks scoped to `process_name` and the instance owning `external_task_id`.
    ///
    /// Must not mutate engine state. Transport failures are
    /// [`SagaError::EngineUnavailable`](crate::error::SagaError::EngineUnavailable).
    async fn subtasks(&self, process_name: &str, external_task_id: &str) -> Result<Vec<Subtask>>;
}

/// External task lifecycle used by the poller
#[async_trait]
pub trait ExternalTaskClient: Send + Sync {
    /// Fetch and lock up to `max_tasks` tasks published on `topic_name`
    async fn fetch_and_lock(
        &self,
        topic_name: &str,
        max_tasks: u32,
        lock_duration: Duration,
    ) -> Result<Vec<ExternalTask>>;

    /// Mark the external task as done so the engine moves the instance on
    async fn complete(&self, external_task_id: &str) -> Result<()>;
}
