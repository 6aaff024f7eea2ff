//! Upstream queries feeding the refresh cycle.
//!
//! The orchestrator only sees the [`Upstream`] trait; whether samples come
//! from the aggregation HTTP API or a local file is an implementation detail.

mod file;
#[cfg(feature = "http")]
mod http;

pub use file::FileUpstream;
#[cfg(feature = "http")]
pub use http::{HttpUpstream, HttpUpstreamConfig};

use crate::core::{AggregationSample, HistoryWindow, LatestSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Body of `GET /api/latest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub locations: Vec<AggregationSample>,
}

/// Body of `GET /api/history`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub points: Vec<AggregationSample>,
}

/// The two read-only upstream queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamQuery {
    LatestSnapshot,
    HistoryWindow,
}

impl fmt::Display for UpstreamQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamQuery::LatestSnapshot => f.write_str("latest snapshot"),
            UpstreamQuery::HistoryWindow => f.write_str("history window"),
        }
    }
}

/// Upstream error types.
#[derive(Debug)]
pub enum UpstreamError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Malformed payload
    Serialization(String),
    /// Local file error
    Io(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Config(msg) => write!(f, "Upstream config error: {msg}"),
            UpstreamError::Network(msg) => write!(f, "Upstream network error: {msg}"),
            UpstreamError::Server { status, message } => {
                write!(f, "Upstream server error ({status}): {message}")
            }
            UpstreamError::Serialization(msg) => write!(f, "Upstream payload error: {msg}"),
            UpstreamError::Io(msg) => write!(f, "Upstream IO error: {msg}"),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Source of aggregation samples.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Most recent sample per monitored location.
    async fn fetch_latest_snapshot(&self) -> Result<LatestSnapshot, UpstreamError>;

    /// Samples whose window ended within the trailing `minutes`.
    async fn fetch_history_window(&self, minutes: u32) -> Result<HistoryWindow, UpstreamError>;

    /// Human-readable description, used in logs.
    fn description(&self) -> &str;
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for Arc<U> {
    async fn fetch_latest_snapshot(&self) -> Result<LatestSnapshot, UpstreamError> {
        (**self).fetch_latest_snapshot().await
    }

    async fn fetch_history_window(&self, minutes: u32) -> Result<HistoryWindow, UpstreamError> {
        (**self).fetch_history_window(minutes).await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
