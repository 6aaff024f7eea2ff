//! Aggregation samples and the two upstream datasets built from them.
//!
//! A sample is one aggregation window for one monitored location. Samples are
//! immutable once read; the snapshot and history collections are rebuilt from
//! scratch every refresh cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of the Dow's Lake monitoring site.
pub const DOWS_LAKE: &str = "Dow's Lake";
/// Identifier of the Fifth Avenue monitoring site.
pub const FIFTH_AVENUE: &str = "Fifth Avenue";
/// Identifier of the NAC monitoring site.
pub const NAC: &str = "NAC";

/// A monitored location, identified by the string the sensors report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name shown on cards and chart legends.
    pub fn display_name(&self) -> &str {
        &self.0
    }

    /// Stable lowercase slug, e.g. `"Dow's Lake"` -> `"dows-lake"`.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.0.len());
        let mut pending_dash = false;

        for c in self.0.chars() {
            if c == '\'' || c == '\u{2019}' {
                continue;
            }
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        slug
    }

    /// DOM id of the status card for this location.
    pub fn card_id(&self) -> String {
        format!("card-{}", self.slug())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Location {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The three canal sites, in their canonical display order.
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new(DOWS_LAKE),
        Location::new(FIFTH_AVENUE),
        Location::new(NAC),
    ]
}

/// One aggregation window for one location.
///
/// Metric fields are optional because upstream projections may omit them
/// (the history query only carries ice thickness and surface temperature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSample {
    /// Site that produced the window
    pub location: Location,
    /// End of the aggregation window; the canonical ordering key
    pub window_end: DateTime<Utc>,
    /// Average ice thickness (cm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_ice_thickness: Option<f64>,
    /// Average surface temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_surface_temp: Option<f64>,
    /// Average external air temperature (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_external_temp: Option<f64>,
    /// Maximum snow accumulation (cm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_snow_accumulation: Option<f64>,
    /// Raw safety label as reported upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_status: Option<String>,
}

impl AggregationSample {
    /// Create a sample with no metrics and no status.
    pub fn new(location: impl Into<Location>, window_end: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            window_end,
            avg_ice_thickness: None,
            avg_surface_temp: None,
            avg_external_temp: None,
            max_snow_accumulation: None,
            safety_status: None,
        }
    }

    pub fn with_ice_thickness(mut self, cm: f64) -> Self {
        self.avg_ice_thickness = Some(cm);
        self
    }

    pub fn with_surface_temp(mut self, celsius: f64) -> Self {
        self.avg_surface_temp = Some(celsius);
        self
    }

    pub fn with_external_temp(mut self, celsius: f64) -> Self {
        self.avg_external_temp = Some(celsius);
        self
    }

    pub fn with_snow_accumulation(mut self, cm: f64) -> Self {
        self.max_snow_accumulation = Some(cm);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.safety_status = Some(status.into());
        self
    }
}

/// Most recent sample per location.
///
/// Iteration order of the underlying map is never used for decisions;
/// callers walk it through an explicit location list.
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshot {
    entries: HashMap<Location, AggregationSample>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot keeping the newest `window_end` per location.
    ///
    /// When two samples share the newest `window_end`, the later one wins.
    pub fn from_samples(samples: impl IntoIterator<Item = AggregationSample>) -> Self {
        let mut entries: HashMap<Location, AggregationSample> = HashMap::new();

        for sample in samples {
            let newer = entries
                .get(&sample.location)
                .map_or(true, |current| sample.window_end >= current.window_end);
            if newer {
                entries.insert(sample.location.clone(), sample);
            }
        }

        Self { entries }
    }

    /// Insert or replace the entry for the sample's location.
    pub fn insert(&mut self, sample: AggregationSample) -> Option<AggregationSample> {
        self.entries.insert(sample.location.clone(), sample)
    }

    pub fn get(&self, location: &Location) -> Option<&AggregationSample> {
        self.entries.get(location)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the snapshot, returning samples for `order` first, in that
    /// order, followed by any other locations sorted by id.
    pub fn into_ordered_samples(mut self, order: &[Location]) -> Vec<AggregationSample> {
        let mut samples: Vec<AggregationSample> = order
            .iter()
            .filter_map(|location| self.entries.remove(location))
            .collect();
        samples.extend(self.into_samples());
        samples
    }

    /// Consume the snapshot, returning its samples sorted by location id.
    pub fn into_samples(self) -> Vec<AggregationSample> {
        let mut samples: Vec<AggregationSample> = self.entries.into_values().collect();
        samples.sort_by(|a, b| a.location.cmp(&b.location));
        samples
    }
}

/// Samples from a trailing time window, in the order they were received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryWindow {
    samples: Vec<AggregationSample>,
}

impl HistoryWindow {
    pub fn new(samples: Vec<AggregationSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[AggregationSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AggregationSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<AggregationSample> {
        self.samples
    }
}

impl From<Vec<AggregationSample>> for HistoryWindow {
    fn from(samples: Vec<AggregationSample>) -> Self {
        Self::new(samples)
    }
}
