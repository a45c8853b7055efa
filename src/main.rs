//! # Saga Worker
//!
//! Polls the workflow engine for the final step of the credit recognition saga
//! and notifies the secretariat once every subtask of an instance is finished.

use anyhow::{Context, Result};
use sagas_core::bootstrap::bootstrap;
use sagas_core::config::ConfigManager;
use sagas_core::logging::init_structured_logging;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_structured_logging();

    let manager = ConfigManager::load().context("failed to load saga configuration")?;
    let worker = bootstrap(manager.config())
        .await
        .context("failed to wire the final step worker")?;

    let cancel = CancellationToken::new();
    let worker_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { worker.run(cancel).await })
    };

    info!(
        environment = %manager.environment(),
        config_directory = %manager.config_directory().display(),
        "Worker running... Press Ctrl+C to shutdown gracefully"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        result = wait_for_sigterm() => {
            match result {
                Ok(_) => info!("Received SIGTERM, initiating graceful shutdown..."),
                Err(e) => warn!("Error setting up SIGTERM handler: {}", e),
            }
        }
    }

    cancel.cancel();
    worker_task.await.context("worker task panicked")?;
    info!("Worker shutdown complete");

    Ok(())
}

/// Wait for SIGTERM signal (for container deployments)
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    std::future::pending::<()>().await;
    Ok(())
}
