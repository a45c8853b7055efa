//! # External Task Worker
//!
//! The poll loop that drives a [`SagaStep`]: fetch and lock the tasks published
//! on the step's topic, evaluate each one, and complete the external task in
//! the engine once the step reports `Completed`. Pending tasks are left alone;
//! their lock expires and the engine offers them again on a later poll.

use crate::config::SagaConfig;
use crate::engine::ExternalTaskClient;
use crate::error::Result;
use crate::logging::log_error;
use crate::models::{CompletionResult, ExternalTask};
use crate::saga::SagaStep;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Counters for one poll round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub fetched: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
}

enum TaskOutcome {
    Completed,
    Pending,
    Failed,
}

pub struct ExternalTaskWorker {
    client: Arc<dyn ExternalTaskClient>,
    step: Arc<dyn SagaStep>,
    process_name: String,
    topic_name: String,
    max_tasks: u32,
    lock_duration: Duration,
    poll_interval: Duration,
}

impl ExternalTaskWorker {
    pub fn from_config(
        config: &SagaConfig,
        client: Arc<dyn ExternalTaskClient>,
        step: Arc<dyn SagaStep>,
    ) -> Self {
        Self {
            client,
            step,
            process_name: config.step.process_name.clone(),
            topic_name: config.step.topic_name.clone(),
            max_tasks: config.engine.max_tasks,
            lock_duration: Duration::from_millis(config.engine.lock_duration_ms),
            poll_interval: config.step.poll_interval(),
        }
    }

    /// Fetch one batch and evaluate it; tasks of different instances run concurrently
    pub async fn poll_once(&self, cancel: &CancellationToken) -> Result<PollSummary> {
        let tasks = self
            .client
            .fetch_and_lock(&self.topic_name, self.max_tasks, self.lock_duration)
            .await?;

        let outcomes = join_all(tasks.iter().map(|task| self.handle(task, cancel))).await;

        let mut summary = PollSummary {
            fetched: tasks.len(),
            ..PollSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Completed => summary.completed += 1,
                TaskOutcome::Pending => summary.pending += 1,
                TaskOutcome::Failed => summary.failed += 1,
            }
        }
        Ok(summary)
    }

    async fn handle(&self, task: &ExternalTask, cancel: &CancellationToken) -> TaskOutcome {
        match self.step.finish_process(&self.process_name, task, cancel).await {
            Ok(CompletionResult::Pending) => TaskOutcome::Pending,
            Ok(CompletionResult::Completed) => match self.client.complete(&task.id).await {
                Ok(()) => TaskOutcome::Completed,
                Err(e) => {
                    log_error(
                        "worker",
                        "complete_external_task",
                        &e.to_string(),
                        Some(&task.id),
                    );
                    TaskOutcome::Failed
                }
            },
            // Already logged by the step with its instance context
            Err(_) => TaskOutcome::Failed,
        }
    }

    /// Poll until `cancel` fires. Engine outages are logged and retried on the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            step = self.step.step_name(),
            process_name = %self.process_name,
            topic_name = %self.topic_name,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "External task worker started"
        );

        while !cancel.is_cancelled() {
            match self.poll_once(&cancel).await {
                Ok(summary) if summary.fetched > 0 => info!(
                    fetched = summary.fetched,
                    completed = summary.completed,
                    pending = summary.pending,
                    failed = summary.failed,
                    "Poll round finished"
                ),
                Ok(_) => debug!("No external tasks available"),
                Err(e) => log_error("worker", "poll", &e.to_string(), Some(&self.topic_name)),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("External task worker stopped");
    }
}
