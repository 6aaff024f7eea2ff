//! HTTP client for the aggregation API.
//!
//! Expects `GET /api/latest` -> `{"locations": [...]}` and
//! `GET /api/history?minutes=N` -> `{"points": [...]}`.

use super::{HistoryResponse, LatestResponse, Upstream, UpstreamError};
use crate::core::{HistoryWindow, LatestSnapshot};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP upstream configuration.
#[derive(Debug, Clone)]
pub struct HttpUpstreamConfig {
    /// Base URL of the aggregation API (e.g. `http://127.0.0.1:3000`)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpUpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// URL of the latest-per-location endpoint.
    pub fn latest_url(&self) -> String {
        format!("{}/api/latest", self.base())
    }

    /// URL of the history endpoint for a trailing window.
    pub fn history_url(&self, minutes: u32) -> String {
        format!("{}/api/history?minutes={minutes}", self.base())
    }
}

/// Upstream backed by the aggregation HTTP API.
pub struct HttpUpstream {
    config: HttpUpstreamConfig,
    client: reqwest::Client,
    description: String,
}

impl HttpUpstream {
    pub fn new(config: HttpUpstreamConfig) -> Result<Self, UpstreamError> {
        if config.base_url.trim().is_empty() {
            return Err(UpstreamError::Config("Empty upstream base URL".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Config(format!("Failed to create HTTP client: {e}")))?;
        let description = format!("http: {}", config.base());

        Ok(Self {
            config,
            client,
            description,
        })
    }

    pub fn config(&self) -> &HttpUpstreamConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch_latest_snapshot(&self) -> Result<LatestSnapshot, UpstreamError> {
        let body: LatestResponse = self.get_json(&self.config.latest_url()).await?;
        Ok(LatestSnapshot::from_samples(body.locations))
    }

    async fn fetch_history_window(&self, minutes: u32) -> Result<HistoryWindow, UpstreamError> {
        let body: HistoryResponse = self.get_json(&self.config.history_url(minutes)).await?;
        Ok(HistoryWindow::new(body.points))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
