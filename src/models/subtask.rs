use serde::{Deserialize, Serialize};

/// Status of one subtask as reported by the workflow engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    Finished,
    Pending,
    Failed,
    Unknown,
}

impl SubtaskStatus {
    /// Only a normally finished subtask counts towards completion
    pub fn is_finished(self) -> bool {
        matches!(self, SubtaskStatus::Finished)
    }
}

/// A unit of work inside a process instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub name: Option<String>,
    pub status: SubtaskStatus,
}

impl Subtask {
    pub fn new(id: impl Into<String>, status: SubtaskStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
