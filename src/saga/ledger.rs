//! # Notification Ledger
//!
//! De-duplication record of instances whose completion notification was
//! dispatched. The final step consults it after the completion gate and writes
//! to it right after a successful dispatch.
//!
//! Entries older than the retention window are dropped on every `record` (and,
//! for the file ledger, on `open`). The window has to outlive the time the
//! engine may keep offering a completed instance's task.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use sagas_core::models::ProcessInstanceRef;
//! use sagas_core::saga::{InMemoryNotificationLedger, NotificationLedger};
//!
//! # tokio_test::block_on(async {
//! let ledger = InMemoryNotificationLedger::new();
//! let instance = ProcessInstanceRef::new("creditacoes", "t-42", "creditacao-final-step");
//!
//! assert!(!ledger.is_notified(&instance).await.unwrap());
//! ledger.record(&instance, Utc::now()).await.unwrap();
//! assert!(ledger.is_notified(&instance).await.unwrap());
//! # });
//! ```

use crate::error::{Result, SagaError};
use crate::models::ProcessInstanceRef;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait NotificationLedger: Send + Sync {
    async fn is_notified(&self, instance: &ProcessInstanceRef) -> Result<bool>;

    async fn record(&self, instance: &ProcessInstanceRef, notified_at: DateTime<Utc>) -> Result<()>;
}

/// Retention applied when none is configured
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Oldest `notified_at` still kept at `now`; `None` when the window reaches past the epoch
fn retention_cutoff(now: DateTime<Utc>, retention: Duration) -> Option<DateTime<Utc>> {
    let retention = chrono::Duration::from_std(retention).ok()?;
    now.checked_sub_signed(retention)
}

/// Ledger that lives as long as the worker process
#[derive(Debug)]
pub struct InMemoryNotificationLedger {
    entries: DashMap<ProcessInstanceRef, DateTime<Utc>>,
    retention: Duration,
}

impl Default for InMemoryNotificationLedger {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            retention: DEFAULT_RETENTION,
        }
    }
}

impl InMemoryNotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn notified_at(&self, instance: &ProcessInstanceRef) -> Option<DateTime<Utc>> {
        self.entries.get(instance).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl NotificationLedger for InMemoryNotificationLedger {
    async fn is_notified(&self, instance: &ProcessInstanceRef) -> Result<bool> {
        Ok(self.entries.contains_key(instance))
    }

    async fn record(&self, instance: &ProcessInstanceRef, notified_at: DateTime<Utc>) -> Result<()> {
        if let Some(cutoff) = retention_cutoff(notified_at, self.retention) {
            self.entries.retain(|_, at| *at >= cutoff);
        }
        self.entries.insert(instance.clone(), notified_at);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerEntry {
    instance: ProcessInstanceRef,
    notified_at: DateTime<Utc>,
}

/// Ledger persisted as a JSON array so it survives worker restarts.
///
/// Every record rewrites the whole file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileNotificationLedger {
    path: PathBuf,
    entries: Mutex<HashMap<ProcessInstanceRef, DateTime<Utc>>>,
    retention: Duration,
}

impl FileNotificationLedger {
    /// Open the ledger at `path` with [`DEFAULT_RETENTION`], starting empty when
    /// the file does not exist yet
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_retention(path, DEFAULT_RETENTION).await
    }

    /// Open the ledger at `path`, dropping entries already outside `retention`
    pub async fn open_with_retention(path: impl Into<PathBuf>, retention: Duration) -> Result<Self> {
        let path = path.into();
        let mut entries: HashMap<ProcessInstanceRef, DateTime<Utc>> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<LedgerEntry>>(&bytes)?
                .into_iter()
                .map(|entry| (entry.instance, entry.notified_at))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(SagaError::Ledger(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let loaded = entries.len();
        if let Some(cutoff) = retention_cutoff(Utc::now(), retention) {
            entries.retain(|_, at| *at >= cutoff);
        }

        debug!(
            path = %path.display(),
            entries = entries.len(),
            expired = loaded - entries.len(),
            "Opened notification ledger"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            retention,
        })
    }

    /// Number of instances currently held
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &HashMap<ProcessInstanceRef, DateTime<Utc>>) -> Result<()> {
        let mut snapshot: Vec<LedgerEntry> = entries
            .iter()
            .map(|(instance, notified_at)| LedgerEntry {
                instance: instance.clone(),
                notified_at: *notified_at,
            })
            .collect();
        snapshot.sort_by(|a, b| a.instance.cmp(&b.instance));
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SagaError::Ledger(format!("failed to create {}: {e}", parent.display())))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| SagaError::Ledger(format!("failed to write {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| SagaError::Ledger(format!("failed to replace {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl NotificationLedger for FileNotificationLedger {
    async fn is_notified(&self, instance: &ProcessInstanceRef) -> Result<bool> {
        Ok(self.entries.lock().await.contains_key(instance))
    }

    async fn record(&self, instance: &ProcessInstanceRef, notified_at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if let Some(cutoff) = retention_cutoff(notified_at, self.retention) {
            entries.retain(|_, at| *at >= cutoff);
        }
        entries.insert(instance.clone(), notified_at);
        self.persist(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn instance(id: &str) -> ProcessInstanceRef {
        ProcessInstanceRef::new("creditacoes", id, "creditacao-final-step")
    }

    #[tokio::test]
    async fn test_in_memory_ledger_records() {
        let ledger = InMemoryNotificationLedger::new();
        assert!(!ledger.is_notified(&instance("t-1")).await.unwrap());

        let now = Utc::now();
        ledger.record(&instance("t-1"), now).await.unwrap();

        assert!(ledger.is_notified(&instance("t-1")).await.unwrap());
        assert!(!ledger.is_notified(&instance("t-2")).await.unwrap());
        assert_eq!(ledger.notified_at(&instance("t-1")), Some(now));
    }

    #[tokio::test]
    async fn test_file_ledger_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("ledger.json");

        let ledger = FileNotificationLedger::open(&path).await.unwrap();
        ledger.record(&instance("t-1"), Utc::now()).await.unwrap();
        drop(ledger);

        let reopened = FileNotificationLedger::open(&path).await.unwrap();
        assert!(reopened.is_notified(&instance("t-1")).await.unwrap());
        assert!(!reopened.is_notified(&instance("t-9")).await.unwrap());
    }

    #[tokio::test]
    async fn test_in_memory_ledger_drops_expired_entries_on_record() {
        let ledger = InMemoryNotificationLedger::new().with_retention(Duration::from_secs(3600));
        let now = Utc::now();

        ledger
            .record(&instance("t-recent"), now - chrono::Duration::minutes(10))
            .await
            .unwrap();
        ledger
            .record(&instance("t-old"), now - chrono::Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(ledger.len(), 2);

        ledger.record(&instance("t-new"), now).await.unwrap();

        assert_eq!(ledger.len(), 2);
        assert!(!ledger.is_notified(&instance("t-old")).await.unwrap());
        assert!(ledger.is_notified(&instance("t-recent")).await.unwrap());
        assert!(ledger.is_notified(&instance("t-new")).await.unwrap());
    }

    #[tokio::test]
    async fn test_in_memory_ledger_stays_bounded() {
        let ledger = InMemoryNotificationLedger::new().with_retention(Duration::from_secs(60));
        let start = Utc::now();

        for i in 0..1000 {
            let at = start + chrono::Duration::seconds(i);
            ledger.record(&instance(&format!("t-{i}")), at).await.unwrap();
        }

        // Entries recorded within the last minute, inclusive of the cutoff
        assert_eq!(ledger.len(), 61);
    }

    #[tokio::test]
    async fn test_file_ledger_prunes_on_open_and_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        let now = Utc::now();

        let ledger = FileNotificationLedger::open(&path).await.unwrap();
        ledger
            .record(&instance("t-old"), now - chrono::Duration::days(3))
            .await
            .unwrap();
        ledger.record(&instance("t-1"), now).await.unwrap();
        assert_eq!(ledger.len().await, 2);
        drop(ledger);

        let reopened = FileNotificationLedger::open_with_retention(&path, Duration::from_secs(24 * 3600))
            .await
            .unwrap();
        assert_eq!(reopened.len().await, 1);
        assert!(!reopened.is_notified(&instance("t-old")).await.unwrap());

        reopened.record(&instance("t-2"), now).await.unwrap();
        let raw: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
    }

    #[tokio::test]
    async fn test_file_ledger_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = FileNotificationLedger::open(&path).await.unwrap_err();
        assert!(matches!(err, SagaError::Ledger(_)));
    }
}
