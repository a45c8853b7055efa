//! # Camunda REST Adapter
//!
//! HTTP client for the BPM engine's REST API. Implements both the subtask query
//! used by the completion gate and the external task lifecycle used by the
//! poller.

use super::{ExternalTaskClient, SubtaskQuery};
use crate::config::EngineConfig;
use crate::constants::ENGINE_COMPLETED_REASON;
use crate::error::{Result, SagaError};
use crate::models::{ExternalTask, Subtask, SubtaskStatus};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Historic task entry as returned by `GET /history/task`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoricTask {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    delete_reason: Option<String>,
}

impl From<HistoricTask> for Subtask {
    fn from(task: HistoricTask) -> Self {
        let status = match (task.end_time.as_deref(), task.delete_reason.as_deref()) {
            (None, _) => SubtaskStatus::Pending,
            (Some(_), Some(ENGINE_COMPLETED_REASON)) => SubtaskStatus::Finished,
            (Some(_), Some(_)) => SubtaskStatus::Failed,
            (Some(_), None) => SubtaskStatus::Unknown,
        };
        let subtask = Subtask::new(task.id, status);
        match task.name {
            Some(name) => subtask.with_name(name),
            None => subtask,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalTaskLookup {
    #[serde(default)]
    process_instance_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchTopic<'a> {
    topic_name: &'a str,
    lock_duration: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchAndLockRequest<'a> {
    worker_id: &'a str,
    max_tasks: u32,
    use_priority: bool,
    topics: Vec<FetchTopic<'a>>,
}

/// HTTP client for the engine REST API
pub struct CamundaClient {
    client: Client,
    base_url: String,
    worker_id: String,
}

impl std::fmt::Debug for CamundaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CamundaClient")
            .field("base_url", &self.base_url)
            .field("worker_id", &self.worker_id)
            .finish()
    }
}

impl CamundaClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("sagas-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SagaError::engine_unavailable("building HTTP client", e))?;

        info!(
            "Created CamundaClient for base_url: {}, timeout: {}ms",
            config.base_url, config.request_timeout_ms
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            worker_id: config.worker_id.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn process_instance_of(&self, external_task_id: &str) -> Result<Option<String>> {
        const OPERATION: &str = "looking up external task";
        let url = self.endpoint(&format!("external-task/{external_task_id}"));
        debug!("Looking up external task at: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;

        // A retired task has no subtasks left to offer
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(OPERATION, response).await?;
        let lookup: ExternalTaskLookup = response
            .json()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;
        Ok(lookup.process_instance_id)
    }
}

async fn ensure_success(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(SagaError::engine_unavailable(
        operation,
        format!("{status} - {error_text}"),
    ))
}

#[async_trait]
impl SubtaskQuery for CamundaClient {
    async fn subtasks(&self, process_name: &str, external_task_id: &str) -> Result<Vec<Subtask>> {
        const OPERATION: &str = "querying subtasks";

        let Some(process_instance_id) = self.process_instance_of(external_task_id).await? else {
            debug!(external_task_id = %external_task_id, "External task no longer exists");
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(self.endpoint("history/task"))
            .query(&[
                ("processInstanceId", process_instance_id.as_str()),
                ("processDefinitionKey", process_name),
            ])
            .send()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;

        let tasks: Vec<HistoricTask> = ensure_success(OPERATION, response)
            .await?
            .json()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;

        Ok(tasks.into_iter().map(Subtask::from).collect())
    }
}

#[async_trait]
impl ExternalTaskClient for CamundaClient {
    async fn fetch_and_lock(
        &self,
        topic_name: &str,
        max_tasks: u32,
        lock_duration: Duration,
    ) -> Result<Vec<ExternalTask>> {
        const OPERATION: &str = "fetching external tasks";

        let request = FetchAndLockRequest {
            worker_id: &self.worker_id,
            max_tasks,
            use_priority: true,
            topics: vec![FetchTopic {
                topic_name,
                lock_duration: lock_duration.as_millis() as u64,
            }],
        };

        let response = self
            .client
            .post(self.endpoint("external-task/fetchAndLock"))
            .json(&request)
            .send()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;

        let tasks: Vec<ExternalTask> = ensure_success(OPERATION, response)
            .await?
            .json()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;

        debug!(topic_name = %topic_name, fetched = tasks.len(), "Fetched external tasks");
        Ok(tasks)
    }

    async fn complete(&self, external_task_id: &str) -> Result<()> {
        const OPERATION: &str = "completing external task";

        let response = self
            .client
            .post(self.endpoint(&format!("external-task/{external_task_id}/complete")))
            .json(&json!({ "workerId": self.worker_id }))
            .send()
            .await
            .map_err(|e| SagaError::engine_unavailable(OPERATION, e))?;

        ensure_success(OPERATION, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn historic(end_time: Option<&str>, delete_reason: Option<&str>) -> Subtask {
        Subtask::from(HistoricTask {
            id: "ht-1".to_string(),
            name: Some("Avaliar creditação".to_string()),
            end_time: end_time.map(String::from),
            delete_reason: delete_reason.map(String::from),
        })
    }

    #[test]
    fn test_historic_task_status_mapping() {
        let end = Some("2026-10-01T10:00:00.000+0000");
        assert_eq!(historic(None, None).status, SubtaskStatus::Pending);
        assert_eq!(historic(end, Some("completed")).status, SubtaskStatus::Finished);
        assert_eq!(historic(end, Some("deleted")).status, SubtaskStatus::Failed);
        assert_eq!(historic(end, None).status, SubtaskStatus::Unknown);
    }

    #[test]
    fn test_historic_task_parses_engine_payload() {
        let raw = r#"[{"id":"ht-9","name":"Parecer","endTime":null,"deleteReason":null,"assignee":"joao"}]"#;
        let tasks: Vec<HistoricTask> = serde_json::from_str(raw).unwrap();
        let subtask = Subtask::from(tasks.into_iter().next().unwrap());
        assert_eq!(subtask.id, "ht-9");
        assert_eq!(subtask.name.as_deref(), Some("Parecer"));
        assert_eq!(subtask.status, SubtaskStatus::Pending);
    }

    #[test]
    fn test_endpoint_normalizes_slashes() {
        let client = CamundaClient::new(&EngineConfig {
            base_url: "http://camunda:8080/engine-rest/".to_string(),
            ..EngineConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("/external-task/fetchAndLock"),
            "http://camunda:8080/engine-rest/external-task/fetchAndLock"
        );
    }

    #[test]
    fn test_fetch_and_lock_request_shape() {
        let request = FetchAndLockRequest {
            worker_id: "sagas-worker",
            max_tasks: 5,
            use_priority: true,
            topics: vec![FetchTopic {
                topic_name: "creditacao-final-step",
                lock_duration: 60_000,
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["workerId"], "sagas-worker");
        assert_eq!(value["maxTasks"], 5);
        assert_eq!(value["topics"][0]["topicName"], "creditacao-final-step");
        assert_eq!(value["topics"][0]["lockDuration"], 60_000);
    }
}
