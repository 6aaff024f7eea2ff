//! File-backed upstream.
//!
//! Re-reads the sample file on every fetch, so an external process can keep
//! appending aggregation documents while the dashboard polls.

use super::{Upstream, UpstreamError};
use crate::core::{HistoryWindow, LatestSnapshot, Location};
use crate::store::{SampleStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Upstream that answers both queries from a local sample file.
#[derive(Debug)]
pub struct FileUpstream {
    path: PathBuf,
    locations: Vec<Location>,
    description: String,
}

impl FileUpstream {
    /// Create a file upstream for the given monitored locations.
    pub fn new<P: AsRef<Path>>(path: P, locations: Vec<Location>) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            locations,
            description,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_store(&self) -> Result<SampleStore, UpstreamError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| UpstreamError::Io(format!("{}: {e}", self.path.display())))?;

        SampleStore::parse(&content).map_err(|e| match e {
            StoreError::IoError(msg) => UpstreamError::Io(msg),
            other => UpstreamError::Serialization(other.to_string()),
        })
    }
}

#[async_trait]
impl Upstream for FileUpstream {
    async fn fetch_latest_snapshot(&self) -> Result<LatestSnapshot, UpstreamError> {
        let store = self.load_store().await?;
        Ok(store.latest_per_location(&self.locations))
    }

    async fn fetch_history_window(&self, minutes: u32) -> Result<HistoryWindow, UpstreamError> {
        let store = self.load_store().await?;
        Ok(store.history_window(Utc::now(), minutes))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
