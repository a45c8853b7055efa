//! # External Task
//!
//! An external task as handed out by the workflow engine's fetch-and-lock
//! endpoint, and the reference that identifies one saga step invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A process variable in the engine's wire form: `{"type": "String", "value": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl VariableValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value_type: Some("String".to_string()),
            value: Value::String(value.into()),
        }
    }

    pub fn untyped(value: Value) -> Self {
        Self {
            value_type: None,
            value,
        }
    }
}

/// Variables attached to a process instance. Owned by the engine; read-only here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessVariables(HashMap<String, VariableValue>);

impl ProcessVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: VariableValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A locked external task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTask {
    pub id: String,
    pub topic_name: String,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    #[serde(default)]
    pub variables: ProcessVariables,
}

impl ExternalTask {
    pub fn new(id: impl Into<String>, topic_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic_name: topic_name.into(),
            worker_id: None,
            process_instance_id: None,
            process_definition_key: None,
            variables: ProcessVariables::new(),
        }
    }

    pub fn with_variables(mut self, variables: ProcessVariables) -> Self {
        self.variables = variables;
        self
    }

    /// The reference identifying a step invocation for this task under `process_name`
    pub fn instance_ref(&self, process_name: &str) -> ProcessInstanceRef {
        ProcessInstanceRef::new(process_name, &self.id, &self.topic_name)
    }
}

/// Identifies one invocation target of the saga step. Immutable per call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessInstanceRef {
    pub process_name: String,
    pub external_task_id: String,
    pub topic_name: String,
}

impl ProcessInstanceRef {
    pub fn new(
        process_name: impl Into<String>,
        external_task_id: impl Into<String>,
        topic_name: impl Into<String>,
    ) -> Self {
        Self {
            process_name: process_name.into(),
            external_task_id: external_task_id.into(),
            topic_name: topic_name.into(),
        }
    }
}

impl fmt::Display for ProcessInstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.external_task_id, self.process_name, self.topic_name
        )
    }
}
