//! Render payload: everything a dashboard renderer needs for one refresh.

use crate::core::align::{align, AlignedSeriesSet};
use crate::core::display::{format_fixed, format_time, MISSING};
use crate::core::metric::Metric;
use crate::core::sample::{HistoryWindow, LatestSnapshot, Location};
use crate::core::status::{
    classify, resolve_overall, status_label, DisplayCategory, OverallStatus, Severity,
    UNKNOWN_LABEL,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use uuid::Uuid;

/// X-axis title shared by all history charts.
pub const X_AXIS_TITLE: &str = "Time (last hour)";

/// Inputs to the snapshot/history transform that come from configuration.
#[derive(Debug, Clone)]
pub struct TransformSettings {
    /// Monitored locations; the order decides status ties and card order
    pub locations: Vec<Location>,
    /// Metrics to align, in chart order
    pub metrics: Vec<Metric>,
    /// Zone used for `HH:MM` labels
    pub display_timezone: Tz,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            locations: crate::core::sample::default_locations(),
            metrics: Metric::defaults(),
            display_timezone: chrono_tz::America::Toronto,
        }
    }
}

/// Status card for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCard {
    pub location: Location,
    pub display_name: String,
    pub card_id: String,
    pub severity: Severity,
    pub category: DisplayCategory,
    pub status_label: String,
    pub ice_thickness: String,
    pub surface_temp: String,
    pub external_temp: String,
    pub snow_accumulation: String,
    pub last_window_end: Option<DateTime<Utc>>,
    pub last_window_label: String,
}

impl LocationCard {
    fn build(location: &Location, snapshot: &LatestSnapshot, tz: Tz) -> Self {
        let base = Self {
            location: location.clone(),
            display_name: location.display_name().to_string(),
            card_id: location.card_id(),
            severity: Severity::Unknown,
            category: DisplayCategory::Neutral,
            status_label: UNKNOWN_LABEL.to_string(),
            ice_thickness: MISSING.to_string(),
            surface_temp: MISSING.to_string(),
            external_temp: MISSING.to_string(),
            snow_accumulation: MISSING.to_string(),
            last_window_end: None,
            last_window_label: MISSING.to_string(),
        };

        let Some(sample) = snapshot.get(location) else {
            return base;
        };

        let severity = classify(sample.safety_status.as_deref());
        Self {
            severity,
            category: severity.category(),
            status_label: status_label(sample).to_string(),
            ice_thickness: format_fixed(sample.avg_ice_thickness, 1),
            surface_temp: format_fixed(sample.avg_surface_temp, 1),
            external_temp: format_fixed(sample.avg_external_temp, 1),
            snow_accumulation: format_fixed(sample.max_snow_accumulation, 1),
            last_window_end: Some(sample.window_end),
            last_window_label: format_time(sample.window_end, tz),
            ..base
        }
    }
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPayload {
    pub cycle_id: Uuid,
    /// When the payload was computed; doubles as a staleness marker
    pub generated_at: DateTime<Utc>,
    pub overall: OverallStatus,
    /// One card per configured location, in configured order
    pub per_location: Vec<LocationCard>,
    /// `HH:MM` label per tick of the common axis
    pub axis_labels: Vec<String>,
    pub x_axis_title: String,
    pub series: AlignedSeriesSet,
}

impl RenderPayload {
    /// Transform one snapshot and one history window into a payload.
    pub fn build(
        snapshot: &LatestSnapshot,
        history: &HistoryWindow,
        settings: &TransformSettings,
    ) -> Self {
        let tz = settings.display_timezone;
        let series = align(history, &settings.locations, &settings.metrics);
        let axis_labels = series.axis.iter().map(|t| format_time(*t, tz)).collect();

        Self {
            cycle_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            overall: resolve_overall(snapshot, &settings.locations),
            per_location: settings
                .locations
                .iter()
                .map(|location| LocationCard::build(location, snapshot, tz))
                .collect(),
            axis_labels,
            x_axis_title: X_AXIS_TITLE.to_string(),
            series,
        }
    }

    pub fn card(&self, location: &Location) -> Option<&LocationCard> {
        self.per_location.iter().find(|c| &c.location == location)
    }

    /// Plain-text rendering for terminals.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Overall status: {}\nGenerated at: {}\n\nLocations:\n",
            self.overall.label,
            self.generated_at.to_rfc3339()
        );

        for card in &self.per_location {
            out.push_str(&format!(
                "  {:<14} {:<8} ice {} cm, surface {} °C, external {} °C, snow {} cm (window {})\n",
                card.display_name,
                card.status_label,
                card.ice_thickness,
                card.surface_temp,
                card.external_temp,
                card.snow_accumulation,
                card.last_window_label,
            ));
        }

        if self.series.is_empty() {
            out.push_str("\nHistory: no data in window\n");
        } else {
            out.push_str(&format!(
                "\nHistory: {} ticks from {} to {}\n",
                self.series.len(),
                self.axis_labels.first().map(String::as_str).unwrap_or(MISSING),
                self.axis_labels.last().map(String::as_str).unwrap_or(MISSING),
            ));
        }

        out
    }
}
