//! Core transform for the dashboard.
//!
//! This module contains:
//! - Sample, snapshot and history types
//! - Status classification and overall status resolution
//! - Alignment of history onto a common time axis
//! - Render payload building

pub mod align;
pub mod display;
pub mod metric;
pub mod payload;
pub mod sample;
pub mod status;

// Re-export commonly used types
pub use align::{align, round_value, AlignedSeriesSet, LocationSeries, MetricSeries};
pub use metric::Metric;
pub use payload::{LocationCard, RenderPayload, TransformSettings};
pub use sample::{default_locations, AggregationSample, HistoryWindow, LatestSnapshot, Location};
pub use status::{classify, resolve_overall, DisplayCategory, OverallStatus, Severity};
