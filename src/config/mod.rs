//! # Saga Configuration System
//!
//! Explicit, validated configuration loaded once at process start and injected
//! into the components that need it. Nothing in the crate reads settings ad hoc.
//!
//! ## Architecture
//!
//! - **Single Source of Truth**: YAML files under `config/`, plus `SAGAS_*` environment overrides
//! - **Environment Awareness**: `config/sagas.{env}.yaml` overrides the base file
//! - **Explicit Validation**: No silent fallbacks for required settings
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sagas_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let recipient = manager.config().setting("EmailSecretaria", "Email")?;
//! let poll_every = manager.config().step.poll_interval();
//! # let _ = (recipient, poll_every);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::settings;
use crate::notification::AttachmentListStyle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/sagas.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SagaConfig {
    /// Workflow engine (BPM) REST endpoint and external task locking
    pub engine: EngineConfig,

    /// Ticketing system holding the card attachments
    pub ticketing: TicketingConfig,

    /// Notification channel selection and formatting
    pub notification: NotificationConfig,

    /// Saga step identity and invocation bounds
    pub step: StepConfig,

    /// Free-form `section -> key -> value` settings (recipient addresses etc.)
    pub settings: Settings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub worker_id: String,
    pub max_tasks: u32,
    pub lock_duration_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/engine-rest".to_string(),
            worker_id: "sagas-worker".to_string(),
            max_tasks: 10,
            lock_duration_ms: 60_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TicketingConfig {
    pub base_url: String,
    pub api_key: String,
    pub token: String,
    pub request_timeout_ms: u64,
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.trello.com".to_string(),
            api_key: String::new(),
            token: String::new(),
            request_timeout_ms: 30_000,
        }
    }
}

impl TicketingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Which [`NotificationChannel`](crate::notification::NotificationChannel) the worker wires up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel: ChannelKind,
    pub webhook_url: Option<String>,
    pub attachment_list_style: AttachmentListStyle,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StepConfig {
    pub process_name: String,
    pub topic_name: String,
    /// Upper bound applied to each external call made during one invocation
    pub invocation_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// When set, notified instances are recorded in this JSON file
    pub ledger_path: Option<PathBuf>,
    /// How long a notified instance is remembered by the ledger
    pub ledger_retention_ms: u64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            process_name: "creditacoes".to_string(),
            topic_name: "creditacao-final-step".to_string(),
            invocation_timeout_ms: 60_000,
            poll_interval_ms: 5_000,
            ledger_path: None,
            ledger_retention_ms: 7 * 24 * 60 * 60 * 1000,
        }
    }
}

impl StepConfig {
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ledger_retention(&self) -> Duration {
        Duration::from_millis(self.ledger_retention_ms)
    }
}

/// Sectioned string settings.
///
/// Lookups ignore ASCII case: the `config` crate lowercases keys read from files
/// and the environment, while callers use the canonical `EmailSecretaria.Email`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Settings(HashMap<String, HashMap<String, String>>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, section: &str, key: &str, value: impl Into<String>) -> Self {
        self.insert(section, key, value);
        self
    }

    pub fn insert(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.0
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(section))
            .flat_map(|(_, entries)| entries.iter())
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

impl SagaConfig {
    /// Look up a required `section.key` setting; absent or blank values are errors
    pub fn setting(&self, section: &str, key: &str) -> ConfigResult<&str> {
        match self.settings.get(section, key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigurationError::missing_setting(section, key)),
        }
    }

    /// Validate the configuration after loading
    pub fn validate(&self) -> ConfigResult<()> {
        require_non_empty("engine.base_url", &self.engine.base_url)?;
        require_non_empty("engine.worker_id", &self.engine.worker_id)?;
        require_non_empty("ticketing.base_url", &self.ticketing.base_url)?;
        require_non_empty("step.process_name", &self.step.process_name)?;
        require_non_empty("step.topic_name", &self.step.topic_name)?;

        if self.engine.max_tasks == 0 {
            return Err(ConfigurationError::invalid_value(
                "engine.max_tasks",
                "0",
                "must fetch at least one task per poll",
            ));
        }

        for (field, value) in [
            ("engine.lock_duration_ms", self.engine.lock_duration_ms),
            ("engine.request_timeout_ms", self.engine.request_timeout_ms),
            ("ticketing.request_timeout_ms", self.ticketing.request_timeout_ms),
            ("step.invocation_timeout_ms", self.step.invocation_timeout_ms),
            ("step.poll_interval_ms", self.step.poll_interval_ms),
            ("step.ledger_retention_ms", self.step.ledger_retention_ms),
        ] {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "must be greater than zero",
                ));
            }
        }

        if self.notification.channel == ChannelKind::Webhook {
            let url = self.notification.webhook_url.as_deref().unwrap_or_default();
            require_non_empty("notification.webhook_url", url)?;
        }

        self.setting(settings::RECIPIENT_SECTION, settings::RECIPIENT_KEY)?;

        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::validation_error(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}
