//! In-memory sample store answering the two upstream queries.
//!
//! Backs [`crate::upstream::FileUpstream`] and the dashboard server's data API.
//! Samples are loaded from a JSON array or from JSON lines.

use crate::core::{AggregationSample, HistoryWindow, LatestSnapshot, Location};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Errors raised while loading samples.
#[derive(Debug)]
pub enum StoreError {
    IoError(String),
    ParseError { line: Option<usize>, message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "IO error: {e}"),
            StoreError::ParseError {
                line: Some(line),
                message,
            } => write!(f, "Parse error on line {line}: {message}"),
            StoreError::ParseError { line: None, message } => write!(f, "Parse error: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A collection of samples in arrival order.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<AggregationSample>,
}

impl SampleStore {
    pub fn new(samples: Vec<AggregationSample>) -> Self {
        Self { samples }
    }

    /// Read and parse a sample file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::IoError(format!("{}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Parse either a JSON array of samples or one sample per line.
    pub fn parse(content: &str) -> Result<Self, StoreError> {
        let trimmed = content.trim_start();

        if trimmed.starts_with('[') {
            let samples = serde_json::from_str(trimmed).map_err(|e| StoreError::ParseError {
                line: None,
                message: e.to_string(),
            })?;
            return Ok(Self::new(samples));
        }

        let mut samples = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let sample = serde_json::from_str(line).map_err(|e| StoreError::ParseError {
                line: Some(idx + 1),
                message: e.to_string(),
            })?;
            samples.push(sample);
        }

        Ok(Self::new(samples))
    }

    pub fn samples(&self) -> &[AggregationSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: AggregationSample) {
        self.samples.push(sample);
    }

    /// Newest sample for each of the given locations.
    pub fn latest_per_location(&self, locations: &[Location]) -> LatestSnapshot {
        LatestSnapshot::from_samples(
            self.samples
                .iter()
                .filter(|s| locations.contains(&s.location))
                .cloned(),
        )
    }

    /// All samples whose window ended within `minutes` before `now`, oldest first.
    ///
    /// Samples sharing a `window_end` keep their arrival order.
    pub fn history_window(&self, now: DateTime<Utc>, minutes: u32) -> HistoryWindow {
        let cutoff = now - Duration::minutes(i64::from(minutes));

        let mut samples: Vec<AggregationSample> = self
            .samples
            .iter()
            .filter(|s| s.window_end >= cutoff)
            .cloned()
            .collect();
        samples.sort_by_key(|s| s.window_end);

        HistoryWindow::new(samples)
    }
}
