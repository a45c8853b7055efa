//! # Final Step Orchestrator
//!
//! Entry point invoked by the poller for the last step of the credit
//! recognition saga.
//!
//! ## Decision
//!
//! 1. Ask the [`CompletionGate`] whether every subtask finished. If not, return
//!    [`CompletionResult::Pending`] without touching anything else.
//! 2. If the [`NotificationLedger`] already holds the instance, return
//!    [`CompletionResult::Completed`] without notifying again.
//! 3. Read `studentName` and `cardId`, fetch the card attachments, compose the
//!    message and dispatch it. Dispatch is the last fallible external call and,
//!    once started, is not abandoned on cancellation.
//! 4. Record the instance in the ledger and return `Completed`.
//!
//! Calls for the same [`ProcessInstanceRef`] are serialized. Every external
//! call is bounded by the configured timeout. Cancellation is observed up to
//! the start of the dispatch.

use super::ledger::{InMemoryNotificationLedger, NotificationLedger};
use super::locks::InstanceLocks;
use super::variables;
use super::SagaStep;
use crate::config::SagaConfig;
use crate::constants::{operations, variables as variable_names};
use crate::engine::{CompletionGate, SubtaskQuery};
use crate::error::{Result, SagaError};
use crate::logging::{log_error, log_step_operation};
use crate::models::{CompletionResult, ExternalTask, ProcessInstanceRef};
use crate::notification::{NotificationChannel, NotificationComposer, NotificationDispatcher};
use crate::ticketing::{AttachmentAggregator, TicketingSystem};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

pub struct FinalStepOrchestrator {
    gate: CompletionGate,
    aggregator: AttachmentAggregator,
    composer: NotificationComposer,
    dispatcher: NotificationDispatcher,
    ledger: Arc<dyn NotificationLedger>,
    locks: InstanceLocks,
    call_timeout: Duration,
}

impl FinalStepOrchestrator {
    pub fn new(
        gate: CompletionGate,
        aggregator: AttachmentAggregator,
        composer: NotificationComposer,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            gate,
            aggregator,
            composer,
            dispatcher,
            ledger: Arc::new(InMemoryNotificationLedger::new()),
            locks: InstanceLocks::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Wire the step from configuration and the three external collaborators
    pub fn from_config(
        config: &SagaConfig,
        subtasks: Arc<dyn SubtaskQuery>,
        ticketing: Arc<dyn TicketingSystem>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Result<Self> {
        let composer = NotificationComposer::from_config(config)?;
        Ok(Self::new(
            CompletionGate::new(subtasks),
            AttachmentAggregator::new(ticketing),
            composer,
            NotificationDispatcher::new(channel),
        )
        .with_call_timeout(config.step.invocation_timeout()))
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn NotificationLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Bound `call` by the call timeout only
    async fn timed<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SagaError::Timeout {
                operation: operation.to_string(),
                timeout: self.call_timeout,
            }),
        }
    }

    /// Bound `call` by the call timeout and abandon it when `cancel` fires
    async fn bounded<T, F>(&self, operation: &str, cancel: &CancellationToken, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SagaError::Cancelled {
                operation: operation.to_string(),
            }),
            result = self.timed(operation, call) => result,
        }
    }

    async fn run_locked(
        &self,
        instance: &ProcessInstanceRef,
        task: &ExternalTask,
        cancel: &CancellationToken,
    ) -> Result<CompletionResult> {
        let complete = self
            .bounded(
                operations::COMPLETION_GATE,
                cancel,
                self.gate
                    .is_complete(&instance.process_name, &instance.external_task_id),
            )
            .await?;

        if !complete {
            log_step_operation(
                operations::FINISH_PROCESS,
                instance,
                "Task isn't finished.., waiting for the next pool",
                None,
            );
            return Ok(CompletionResult::Pending);
        }

        let already_notified = self
            .bounded(operations::LEDGER_LOOKUP, cancel, self.ledger.is_notified(instance))
            .await?;
        if already_notified {
            log_step_operation(
                operations::FINISH_PROCESS,
                instance,
                "Task is completed",
                Some("notification already dispatched for this instance"),
            );
            return Ok(CompletionResult::Completed);
        }

        let student_name = variables::string_variable(task, variable_names::STUDENT_NAME)?;
        let card_id = variables::string_variable(task, variable_names::CARD_ID)?;

        let attachments = self
            .bounded(
                operations::FETCH_ATTACHMENTS,
                cancel,
                self.aggregator.attachments(&card_id),
            )
            .await?;

        let message = self.composer.compose(&student_name, &attachments);

        // Cancellation is honoured up to here; a started send runs to completion
        if cancel.is_cancelled() {
            return Err(SagaError::Cancelled {
                operation: operations::DISPATCH_NOTIFICATION.to_string(),
            });
        }
        self.timed(
            operations::DISPATCH_NOTIFICATION,
            self.dispatcher.send(&message),
        )
        .await?;

        // The message is out: from here on nothing may turn the result into an error
        if let Err(e) = self
            .timed(
                operations::RECORD_NOTIFICATION,
                self.ledger.record(instance, Utc::now()),
            )
            .await
        {
            warn!(
                operation = operations::RECORD_NOTIFICATION,
                external_task_id = %instance.external_task_id,
                error = %e,
                "Notification sent but not recorded in ledger"
            );
        }

        log_step_operation(
            operations::FINISH_PROCESS,
            instance,
            "Task is completed",
            Some(&format!("{} attachment(s) listed", attachments.len())),
        );
        Ok(CompletionResult::Completed)
    }
}

#[async_trait]
impl SagaStep for FinalStepOrchestrator {
    async fn finish_process(
        &self,
        process_name: &str,
        task: &ExternalTask,
        cancel: &CancellationToken,
    ) -> Result<CompletionResult> {
        let instance = task.instance_ref(process_name);
        log_step_operation(operations::FINISH_PROCESS, &instance, "executing..", None);

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(SagaError::Cancelled {
                    operation: operations::FINISH_PROCESS.to_string(),
                });
            }
            guard = self.locks.acquire(&instance) => guard,
        };

        let result = self.run_locked(&instance, task, cancel).await;

        if let Err(ref e) = result {
            if e.is_retryable() {
                log_error(
                    "final_step",
                    operations::FINISH_PROCESS,
                    &e.to_string(),
                    Some(&instance.to_string()),
                );
            } else {
                error!(
                    external_task_id = %instance.external_task_id,
                    process_name = %instance.process_name,
                    topic_name = %instance.topic_name,
                    error_code = e.error_code(),
                    defect = true,
                    error = %e,
                    "Process definition or configuration defect; retrying will not help"
                );
            }
        }

        result
    }

    fn step_name(&self) -> &'static str {
        "creditacao_final_step"
    }
}
