//! # Trello Adapter
//!
//! Reads card attachments through the Trello REST API.

use super::TicketingSystem;
use crate::config::{ConfigurationError, TicketingConfig};
use crate::error::{Result, SagaError};
use crate::models::Attachment;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, error, info};

#[derive(Debug, Deserialize)]
struct CardAttachment {
    #[serde(default)]
    url: Option<String>,
}

pub struct TrelloClient {
    client: Client,
    base_url: Url,
    api_key: String,
    token: String,
}

impl std::fmt::Debug for TrelloClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials_configured", &!self.api_key.is_empty())
            .finish()
    }
}

impl TrelloClient {
    pub fn new(config: &TicketingConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConfigurationError::invalid_value("ticketing.base_url", &config.base_url, e.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigurationError::invalid_value(
                "ticketing.base_url",
                &config.base_url,
                "must be an http(s) URL",
            )
            .into());
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("sagas-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SagaError::attachment_fetch_failed("-", e))?;

        info!(
            "Created TrelloClient for base_url: {}, timeout: {}ms",
            config.base_url, config.request_timeout_ms
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            token: config.token.clone(),
        })
    }

    /// `card_id` comes from process data and always ends up as one path segment
    fn attachments_url(&self, card_id: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["1", "cards", card_id, "attachments"]);
        }
        url
    }
}

/// Attachment entries without a URL carry nothing to link and are skipped
fn locators(entries: Vec<CardAttachment>) -> Vec<Attachment> {
    entries
        .into_iter()
        .filter_map(|entry| entry.url)
        .map(Attachment::from)
        .collect()
}

#[async_trait]
impl TicketingSystem for TrelloClient {
    async fn card_attachments(&self, card_id: &str) -> Result<Vec<Attachment>> {
        let url = self.attachments_url(card_id);
        debug!("Fetching card attachments from: {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", self.token.as_str()),
                ("fields", "url"),
            ])
            .send()
            .await
            .map_err(|e| SagaError::attachment_fetch_failed(card_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Attachment request failed: {} - {}", status, error_text);
            return Err(SagaError::attachment_fetch_failed(
                card_id,
                format!("{status} - {error_text}"),
            ));
        }

        let entries: Vec<CardAttachment> = response
            .json()
            .await
            .map_err(|e| SagaError::attachment_fetch_failed(card_id, e))?;

        Ok(locators(entries))
    }
}
