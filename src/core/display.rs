//! Text formatting for card fields and chart labels.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Placeholder for a missing value.
pub const MISSING: &str = "-";

/// Format a value with a fixed number of decimals, or `-` when absent.
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => MISSING.to_string(),
    }
}

/// Format a timestamp as `HH:MM` in the display time zone.
pub fn format_time(timestamp: DateTime<Utc>, tz: Tz) -> String {
    timestamp.with_timezone(&tz).format("%H:%M").to_string()
}
