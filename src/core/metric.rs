//! Numeric sample fields that can be charted.

use crate::core::sample::AggregationSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chartable metric, named by its wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    AvgIceThickness,
    AvgSurfaceTemp,
    AvgExternalTemp,
    MaxSnowAccumulation,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AvgIceThickness,
        Metric::AvgSurfaceTemp,
        Metric::AvgExternalTemp,
        Metric::MaxSnowAccumulation,
    ];

    /// Metrics charted when none are configured.
    pub fn defaults() -> Vec<Metric> {
        vec![Metric::AvgIceThickness, Metric::AvgSurfaceTemp]
    }

    /// Field name used in upstream documents.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Metric::AvgIceThickness => "avgIceThickness",
            Metric::AvgSurfaceTemp => "avgSurfaceTemp",
            Metric::AvgExternalTemp => "avgExternalTemp",
            Metric::MaxSnowAccumulation => "maxSnowAccumulation",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::AvgIceThickness | Metric::MaxSnowAccumulation => "cm",
            Metric::AvgSurfaceTemp | Metric::AvgExternalTemp => "°C",
        }
    }

    /// Y-axis title for this metric's chart.
    pub fn axis_title(&self) -> &'static str {
        match self {
            Metric::AvgIceThickness => "Ice Thickness (cm)",
            Metric::AvgSurfaceTemp => "Surface Temperature (°C)",
            Metric::AvgExternalTemp => "External Temperature (°C)",
            Metric::MaxSnowAccumulation => "Snow Accumulation (cm)",
        }
    }

    /// Read this metric from a sample.
    pub fn value(&self, sample: &AggregationSample) -> Option<f64> {
        match self {
            Metric::AvgIceThickness => sample.avg_ice_thickness,
            Metric::AvgSurfaceTemp => sample.avg_surface_temp,
            Metric::AvgExternalTemp => sample.avg_external_temp,
            Metric::MaxSnowAccumulation => sample.max_snow_accumulation,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Error returned when a metric name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown metric: {}", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.wire_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownMetric(name.to_string()))
    }
}
