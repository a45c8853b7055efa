//! # Worker Bootstrap
//!
//! Wires the concrete adapters selected by configuration into a ready-to-run
//! [`ExternalTaskWorker`].

use crate::config::{ChannelKind, SagaConfig};
use crate::engine::CamundaClient;
use crate::error::{Result, SagaError};
use crate::notification::{LogChannel, NotificationChannel, WebhookChannel};
use crate::saga::{
    FileNotificationLedger, FinalStepOrchestrator, InMemoryNotificationLedger, NotificationLedger,
};
use crate::ticketing::TrelloClient;
use crate::worker::ExternalTaskWorker;
use std::sync::Arc;
use tracing::info;

pub async fn bootstrap(config: &SagaConfig) -> Result<ExternalTaskWorker> {
    let engine = Arc::new(CamundaClient::new(&config.engine)?);
    let ticketing = Arc::new(TrelloClient::new(&config.ticketing)?);
    let channel = notification_channel(config)?;
    let ledger = notification_ledger(config).await?;

    let step = FinalStepOrchestrator::from_config(config, engine.clone(), ticketing, channel)?
        .with_ledger(ledger);

    info!(
        process_name = %config.step.process_name,
        topic_name = %config.step.topic_name,
        channel = ?config.notification.channel,
        durable_ledger = config.step.ledger_path.is_some(),
        "Final step wired"
    );

    Ok(ExternalTaskWorker::from_config(config, engine, Arc::new(step)))
}

fn notification_channel(config: &SagaConfig) -> Result<Arc<dyn NotificationChannel>> {
    match config.notification.channel {
        ChannelKind::Log => Ok(Arc::new(LogChannel)),
        ChannelKind::Webhook => {
            let url = config.notification.webhook_url.as_deref().ok_or_else(|| {
                SagaError::Configuration(crate::config::ConfigurationError::validation_error(
                    "notification.webhook_url is required for the webhook channel",
                ))
            })?;
            Ok(Arc::new(WebhookChannel::new(url, config.step.invocation_timeout())?))
        }
    }
}

async fn notification_ledger(config: &SagaConfig) -> Result<Arc<dyn NotificationLedger>> {
    let retention = config.step.ledger_retention();
    match &config.step.ledger_path {
        Some(path) => Ok(Arc::new(
            FileNotificationLedger::open_with_retention(path, retention).await?,
        )),
        None => Ok(Arc::new(
            InMemoryNotificationLedger::new().with_retention(retention),
        )),
    }
}
