//! # Task Completion Gate
//!
//! The single authoritative answer to "has every subtask of this instance
//! finished?".

use super::SubtaskQuery;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

pub struct CompletionGate {
    query: Arc<dyn SubtaskQuery>,
}

impl CompletionGate {
    pub fn new(query: Arc<dyn SubtaskQuery>) -> Self {
        Self { query }
    }

    /// `true` only when the scope has subtasks and all of them finished.
    ///
    /// An empty scope is reported as not complete: the engine either has not
    /// created the subtasks yet or has already retired the instance, and in
    /// neither case should the step notify.
    pub async fn is_complete(&self, process_name: &str, external_task_id: &str) -> Result<bool> {
        let subtasks = self.query.subtasks(process_name, external_task_id).await?;

        let total = subtasks.len();
        let finished = subtasks.iter().filter(|s| s.status.is_finished()).count();

        debug!(
            process_name = %process_name,
            external_task_id = %external_task_id,
            total = total,
            finished = finished,
            "Evaluated completion gate"
        );

        Ok(total > 0 && finished == total)
    }
}
