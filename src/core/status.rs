//! Safety status classification and overall status resolution.
//!
//! Raw status labels come straight from upstream documents and may be in any
//! case, empty, or missing entirely. Classification is total: anything that is
//! not a recognized label degrades to [`Severity::Unknown`].

use crate::core::sample::{AggregationSample, LatestSnapshot, Location};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when a location has no usable status.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Severity of a safety status. Higher is less safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Safe,
    Caution,
    Unsafe,
}

impl Severity {
    /// Numeric rank: `unsafe=3`, `caution=2`, `safe=1`, `unknown=0`.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Unknown => 0,
            Severity::Safe => 1,
            Severity::Caution => 2,
            Severity::Unsafe => 3,
        }
    }

    /// Canonical label for display when no raw label is available.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Unknown => UNKNOWN_LABEL,
            Severity::Safe => "Safe",
            Severity::Caution => "Caution",
            Severity::Unsafe => "Unsafe",
        }
    }

    pub fn category(&self) -> DisplayCategory {
        match self {
            Severity::Unknown => DisplayCategory::Neutral,
            Severity::Safe => DisplayCategory::Safe,
            Severity::Caution => DisplayCategory::Caution,
            Severity::Unsafe => DisplayCategory::Unsafe,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Presentation category for badges. `Neutral` is never styled as safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayCategory {
    #[serde(rename = "badge-neutral")]
    Neutral,
    #[serde(rename = "badge-safe")]
    Safe,
    #[serde(rename = "badge-caution")]
    Caution,
    #[serde(rename = "badge-unsafe")]
    Unsafe,
}

impl DisplayCategory {
    /// CSS class applied to the status badge.
    pub fn css_class(&self) -> &'static str {
        match self {
            DisplayCategory::Neutral => "badge-neutral",
            DisplayCategory::Safe => "badge-safe",
            DisplayCategory::Caution => "badge-caution",
            DisplayCategory::Unsafe => "badge-unsafe",
        }
    }
}

/// Classify a raw status label. Matching is ASCII case-insensitive.
pub fn classify(label: Option<&str>) -> Severity {
    match label {
        Some(l) if l.eq_ignore_ascii_case("unsafe") => Severity::Unsafe,
        Some(l) if l.eq_ignore_ascii_case("caution") => Severity::Caution,
        Some(l) if l.eq_ignore_ascii_case("safe") => Severity::Safe,
        _ => Severity::Unknown,
    }
}

/// The label shown for a sample: its raw status, or `Unknown` if blank.
pub fn status_label(sample: &AggregationSample) -> &str {
    match sample.safety_status.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => UNKNOWN_LABEL,
    }
}

/// Worst-case status across all reporting locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStatus {
    pub severity: Severity,
    /// Raw label of the deciding location, or `Unknown`
    pub label: String,
    /// Location that attained the maximum severity
    pub location: Option<Location>,
    pub category: DisplayCategory,
}

impl OverallStatus {
    pub fn unknown() -> Self {
        Self {
            severity: Severity::Unknown,
            label: UNKNOWN_LABEL.to_string(),
            location: None,
            category: DisplayCategory::Neutral,
        }
    }
}

/// Resolve the overall status of a snapshot.
///
/// Locations are visited in the given order; the first location to reach the
/// maximum severity decides the label. Locations missing from the snapshot
/// are skipped, and snapshot entries for locations outside `locations` are
/// ignored.
pub fn resolve_overall(snapshot: &LatestSnapshot, locations: &[Location]) -> OverallStatus {
    let mut overall = OverallStatus::unknown();

    for location in locations {
        let Some(sample) = snapshot.get(location) else {
            continue;
        };

        let severity = classify(sample.safety_status.as_deref());
        if severity > overall.severity {
            overall = OverallStatus {
                severity,
                label: status_label(sample).to_string(),
                location: Some(location.clone()),
                category: severity.category(),
            };
        }
    }

    overall
}
