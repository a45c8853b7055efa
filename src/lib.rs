#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sagas Core
//!
//! Poll-driven saga steps for long-running business processes hosted in an
//! external BPM engine.
//!
//! ## Overview
//!
//! The credit recognition ("creditação") process runs in the workflow engine as
//! a set of subtasks handled by different people. Its last step is an external
//! task that a worker polls: on every invocation the step checks whether all
//! subtasks of the instance finished and, only then, collects the card
//! attachments from the ticketing system and notifies the secretariat, once.
//!
//! ## Module Organization
//!
//! - [`saga`] - The [`SagaStep`](saga::SagaStep) trait, the final step orchestrator, ledger and locks
//! - [`engine`] - Completion gate and the workflow engine boundary
//! - [`ticketing`] - Attachment aggregation and the ticketing boundary
//! - [`notification`] - Message composition, dispatch and channels
//! - [`models`] - Data exchanged between the above
//! - [`worker`] - The fetch-and-lock poll loop
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sagas_core::config::ConfigManager;
//! use sagas_core::bootstrap::bootstrap;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let worker = bootstrap(manager.config()).await?;
//!
//! let cancel = CancellationToken::new();
//! let summary = worker.poll_once(&cancel).await?;
//! println!("completed {} of {} tasks", summary.completed, summary.fetched);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod notification;
pub mod saga;
pub mod ticketing;
pub mod worker;

pub use config::{ConfigManager, SagaConfig};
pub use error::{Result, SagaError};
pub use models::{CompletionResult, ExternalTask, ProcessInstanceRef};
pub use saga::{FinalStepOrchestrator, SagaStep};
pub use worker::{ExternalTaskWorker, PollSummary};
