//! In-process stand-ins for the engine, the ticketing system and the
//! notification channel, plus fixtures shared by the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sagas_core::engine::{CompletionGate, ExternalTaskClient, SubtaskQuery};
use sagas_core::error::{Result, SagaError};
use sagas_core::models::{
    Attachment, ExternalTask, NotificationMessage, ProcessInstanceRef, ProcessVariables, Subtask,
    SubtaskStatus, VariableValue,
};
use sagas_core::notification::{
    AttachmentListStyle, NotificationChannel, NotificationComposer, NotificationDispatcher,
};
use sagas_core::saga::NotificationLedger;
use sagas_core::ticketing::{AttachmentAggregator, TicketingSystem};
use sagas_core::FinalStepOrchestrator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PROCESS_NAME: &str = "creditacoes";
pub const TOPIC_NAME: &str = "creditacao-final-step";
pub const RECIPIENT: &str = "secretaria@ismai.pt";

/// Engine double: subtask statuses per external task id, a queue of lockable tasks
/// and the ids the worker completed
#[derive(Debug, Default)]
pub struct MockEngine {
    subtasks: Mutex<HashMap<String, Vec<Subtask>>>,
    queued: Mutex<Vec<ExternalTask>>,
    completed: Mutex<Vec<String>>,
    unavailable: AtomicBool,
    reject_complete: AtomicBool,
    queries: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_statuses(&self, external_task_id: &str, statuses: &[SubtaskStatus]) {
        let subtasks = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Subtask::new(format!("{external_task_id}-sub-{i}"), *status))
            .collect();
        self.subtasks
            .lock()
            .unwrap()
            .insert(external_task_id.to_string(), subtasks);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_reject_complete(&self, reject: bool) {
        self.reject_complete.store(reject, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn enqueue(&self, task: ExternalTask) {
        self.queued.lock().unwrap().push(task);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn completed_ids(&self) -> Vec<String> {
        let mut ids = self.completed.lock().unwrap().clone();
        ids.sort();
        ids
    }
}

#[async_trait]
impl SubtaskQuery for MockEngine {
    async fn subtasks(&self, _process_name: &str, external_task_id: &str) -> Result<Vec<Subtask>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SagaError::engine_unavailable("history/task", "connection refused"));
        }
        Ok(self
            .subtasks
            .lock()
            .unwrap()
            .get(external_task_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ExternalTaskClient for MockEngine {
    async fn fetch_and_lock(
        &self,
        _topic_name: &str,
        max_tasks: u32,
        _lock_duration: Duration,
    ) -> Result<Vec<ExternalTask>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SagaError::engine_unavailable("fetchAndLock", "connection refused"));
        }
        let mut queued = self.queued.lock().unwrap();
        let take = queued.len().min(max_tasks as usize);
        Ok(queued.drain(..take).collect())
    }

    async fn complete(&self, external_task_id: &str) -> Result<()> {
        if self.reject_complete.load(Ordering::SeqCst) {
            return Err(SagaError::engine_unavailable("complete", "lock expired"));
        }
        self.completed
            .lock()
            .unwrap()
            .push(external_task_id.to_string());
        Ok(())
    }
}

/// Ticketing double returning a fixed attachment list for every card
#[derive(Debug, Default)]
pub struct MockTicketing {
    attachments: Mutex<Vec<String>>,
    fail: AtomicBool,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockTicketing {
    pub fn with_attachments(locators: &[&str]) -> Self {
        let ticketing = Self::default();
        *ticketing.attachments.lock().unwrap() =
            locators.iter().map(|l| l.to_string()).collect();
        ticketing
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketingSystem for MockTicketing {
    async fn card_attachments(&self, card_id: &str) -> Result<Vec<Attachment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SagaError::attachment_fetch_failed(card_id, "503 Service Unavailable"));
        }
        Ok(self
            .attachments
            .lock()
            .unwrap()
            .iter()
            .map(Attachment::new)
            .collect())
    }
}

/// Channel double that keeps every delivered message
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<NotificationMessage>>,
    reject: AtomicBool,
    attempts: AtomicUsize,
    ack_delay: Mutex<Option<Duration>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Accept the message immediately but acknowledge only after `delay`
    pub fn set_ack_delay(&self, delay: Duration) {
        *self.ack_delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn deliver(&self, message: &NotificationMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(SagaError::delivery_failed(&message.recipient, "relay rejected message"));
        }
        self.sent.lock().unwrap().push(message.clone());
        let ack_delay = *self.ack_delay.lock().unwrap();
        if let Some(delay) = ack_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "recording"
    }
}

/// Ledger double whose lookups succeed and whose writes always fail
#[derive(Debug, Default)]
pub struct UnwritableLedger {
    writes: AtomicUsize,
}

impl UnwritableLedger {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationLedger for UnwritableLedger {
    async fn is_notified(&self, _instance: &ProcessInstanceRef) -> Result<bool> {
        Ok(false)
    }

    async fn record(&self, _instance: &ProcessInstanceRef, _notified_at: DateTime<Utc>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(SagaError::Ledger("disk full".to_string()))
    }
}

/// A locked task carrying both variables the final step reads
pub fn completed_task(id: &str) -> ExternalTask {
    ExternalTask::new(id, TOPIC_NAME).with_variables(
        ProcessVariables::new()
            .with("studentName", VariableValue::string("Ana Sousa"))
            .with("cardId", VariableValue::string(format!("card-{id}"))),
    )
}

/// The three doubles behind one orchestrator
pub struct Harness {
    pub engine: Arc<MockEngine>,
    pub ticketing: Arc<MockTicketing>,
    pub channel: Arc<RecordingChannel>,
}

impl Harness {
    pub fn new(attachments: &[&str]) -> Self {
        Self {
            engine: Arc::new(MockEngine::new()),
            ticketing: Arc::new(MockTicketing::with_attachments(attachments)),
            channel: Arc::new(RecordingChannel::new()),
        }
    }

    pub fn orchestrator(&self) -> FinalStepOrchestrator {
        self.orchestrator_with_style(AttachmentListStyle::TrailingSeparator)
    }

    pub fn orchestrator_with_style(&self, style: AttachmentListStyle) -> FinalStepOrchestrator {
        FinalStepOrchestrator::new(
            CompletionGate::new(self.engine.clone()),
            AttachmentAggregator::new(self.ticketing.clone()),
            NotificationComposer::new(RECIPIENT, style),
            NotificationDispatcher::new(self.channel.clone()),
        )
    }
}
