//! # Variable Accessor
//!
//! Typed reads of process variables. A required variable that is absent is a
//! process-definition defect, so there are no defaults here.

use crate::error::{Result, SagaError};
use crate::models::ExternalTask;
use serde_json::Value;

/// Raw value of `name`; absent or `null` is [`SagaError::MissingVariable`]
pub fn variable<'a>(task: &'a ExternalTask, name: &str) -> Result<&'a Value> {
    match task.variables.get(name) {
        Some(variable) if !variable.value.is_null() => Ok(&variable.value),
        _ => Err(SagaError::MissingVariable {
            name: name.to_string(),
            external_task_id: task.id.clone(),
        }),
    }
}

/// String form of a scalar variable; objects and arrays are rejected
pub fn string_variable(task: &ExternalTask, name: &str) -> Result<String> {
    let value = variable(task, name)?;
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) | Value::Object(_) | Value::Null => Err(SagaError::InvalidVariable {
            name: name.to_string(),
            external_task_id: task.id.clone(),
            found: value.to_string(),
        }),
    }
}
