//! Alignment of per-location history onto a common time axis.
//!
//! Locations do not report in lock-step, so every location's samples are
//! projected onto the sorted set of all distinct window ends seen in the
//! history. Positions where a location has no sample hold `None`; values are
//! never interpolated.

use crate::core::metric::Metric;
use crate::core::sample::{AggregationSample, HistoryWindow, Location};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Decimal digits kept on aligned values.
pub const VALUE_PRECISION: i32 = 2;

/// Round to [`VALUE_PRECISION`] digits.
///
/// Halves are rounded away from zero on the scaled `f64` product, so inputs
/// whose binary value sits just below a decimal half round down
/// (`1.005` -> `1.0`, while `2.675` -> `2.68`). Values too large to scale
/// already carry no fractional digits and are returned unchanged.
pub fn round_value(value: f64) -> f64 {
    let scale = 10f64.powi(VALUE_PRECISION);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

/// Values for one location, index-aligned with the common axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSeries {
    pub location: Location,
    /// `None` marks a gap
    pub values: Vec<Option<f64>>,
}

/// All location series for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub metric: Metric,
    pub y_axis_title: String,
    pub series: Vec<LocationSeries>,
}

/// Common time axis plus aligned series per metric and location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignedSeriesSet {
    pub axis: Vec<DateTime<Utc>>,
    pub metrics: Vec<MetricSeries>,
}

impl AlignedSeriesSet {
    /// Number of ticks on the common axis.
    pub fn len(&self) -> usize {
        self.axis.len()
    }

    /// True when there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    /// Values for a (location, metric) pair.
    pub fn series(&self, location: &Location, metric: Metric) -> Option<&[Option<f64>]> {
        self.metrics
            .iter()
            .find(|m| m.metric == metric)?
            .series
            .iter()
            .find(|s| &s.location == location)
            .map(|s| s.values.as_slice())
    }
}

/// Align a history window for the given locations and metrics.
///
/// Every sample contributes its `window_end` to the axis. For duplicate
/// `(location, window_end)` pairs the sample that comes later in the input wins.
/// A location without samples still gets a full-length series of gaps.
pub fn align(history: &HistoryWindow, locations: &[Location], metrics: &[Metric]) -> AlignedSeriesSet {
    let mut axis: Vec<DateTime<Utc>> = history.iter().map(|s| s.window_end).collect();
    axis.sort_unstable();
    axis.dedup();

    let mut by_location: HashMap<&Location, HashMap<DateTime<Utc>, &AggregationSample>> =
        HashMap::new();
    for sample in history.iter() {
        by_location
            .entry(&sample.location)
            .or_default()
            .insert(sample.window_end, sample);
    }

    let metrics = metrics
        .iter()
        .map(|&metric| MetricSeries {
            metric,
            y_axis_title: metric.axis_title().to_string(),
            series: locations
                .iter()
                .map(|location| {
                    let lookup = by_location.get(location);
                    let values = axis
                        .iter()
                        .map(|t| {
                            lookup
                                .and_then(|samples| samples.get(t))
                                .and_then(|sample| metric.value(sample))
                                .map(round_value)
                                .filter(|v| v.is_finite())
                        })
                        .collect();
                    LocationSeries {
                        location: location.clone(),
                        values,
                    }
                })
                .collect(),
        })
        .collect();

    AlignedSeriesSet { axis, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::{default_locations, DOWS_LAKE, FIFTH_AVENUE, NAC};
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, minute, 0).unwrap()
    }

    fn ice(location: &str, minute: u32, cm: f64) -> AggregationSample {
        AggregationSample::new(location, at(minute)).with_ice_thickness(cm)
    }

    fn ice_only() -> Vec<Metric> {
        vec![Metric::AvgIceThickness]
    }

    #[test]
    fn test_align_projects_onto_common_axis() {
        let history = HistoryWindow::new(vec![
            ice(NAC, 10, 9.5),
            ice(DOWS_LAKE, 5, 12.3),
            ice(FIFTH_AVENUE, 5, 10.0),
        ]);

        let set = align(&history, &default_locations(), &ice_only());
        assert_eq!(set.axis, vec![at(5), at(10)]);

        let metric = Metric::AvgIceThickness;
        assert_eq!(
            set.series(&Location::new(DOWS_LAKE), metric).unwrap(),
            &[Some(12.3), None]
        );
        assert_eq!(
            set.series(&Location::new(FIFTH_AVENUE), metric).unwrap(),
            &[Some(10.0), None]
        );
        assert_eq!(
            set.series(&Location::new(NAC), metric).unwrap(),
            &[None, Some(9.5)]
        );
    }

    #[test]
    fn test_align_empty_history() {
        let set = align(
            &HistoryWindow::default(),
            &default_locations(),
            &Metric::defaults(),
        );
        assert!(set.is_empty());
        assert_eq!(set.metrics.len(), 2);
        for metric in &set.metrics {
            assert_eq!(metric.series.len(), 3);
            assert!(metric.series.iter().all(|s| s.values.is_empty()));
        }
    }

    #[test]
    fn test_every_series_matches_axis_length() {
        let history = HistoryWindow::new(vec![
            ice(NAC, 1, 1.0),
            ice(NAC, 2, 2.0),
            ice(DOWS_LAKE, 2, 3.0),
            ice(DOWS_LAKE, 3, 4.0),
            ice(NAC, 3, 5.0),
            ice(NAC, 3, 6.0),
        ]);

        let set = align(&history, &default_locations(), &Metric::ALL);
        assert_eq!(set.len(), 3);
        for metric in &set.metrics {
            for series in &metric.series {
                assert_eq!(series.values.len(), set.len());
            }
        }
    }

    #[test]
    fn test_silent_location_is_all_gaps() {
        let history = HistoryWindow::new(vec![ice(NAC, 1, 1.0), ice(NAC, 2, 2.0)]);

        let set = align(&history, &default_locations(), &ice_only());
        let fifth = set
            .series(&Location::new(FIFTH_AVENUE), Metric::AvgIceThickness)
            .unwrap();
        assert_eq!(fifth, &[None, None]);
    }

    #[test]
    fn test_zero_is_a_value_not_a_gap() {
        let history = HistoryWindow::new(vec![
            AggregationSample::new(NAC, at(1)).with_surface_temp(0.0),
            AggregationSample::new(NAC, at(2)),
        ]);

        let set = align(&history, &default_locations(), &[Metric::AvgSurfaceTemp]);
        let nac = set
            .series(&Location::new(NAC), Metric::AvgSurfaceTemp)
            .unwrap();
        assert_eq!(nac, &[Some(0.0), None]);
    }

    #[test]
    fn test_duplicate_window_end_last_write_wins() {
        let history = HistoryWindow::new(vec![ice(NAC, 1, 1.0), ice(NAC, 1, 7.25)]);

        let set = align(&history, &default_locations(), &ice_only());
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.series(&Location::new(NAC), Metric::AvgIceThickness)
                .unwrap(),
            &[Some(7.25)]
        );
    }

    #[test]
    fn test_align_is_invariant_to_input_order() {
        let samples = vec![
            ice(DOWS_LAKE, 3, 30.0),
            ice(NAC, 1, 10.0),
            ice(FIFTH_AVENUE, 2, 20.0),
            ice(NAC, 3, 11.0),
            ice(DOWS_LAKE, 1, 31.0),
        ];
        let mut reversed = samples.clone();
        reversed.reverse();

        let locations = default_locations();
        let forward = align(&HistoryWindow::new(samples), &locations, &Metric::ALL);
        let backward = align(&HistoryWindow::new(reversed), &locations, &Metric::ALL);
        assert_eq!(forward, backward);
        assert_eq!(forward.axis, vec![at(1), at(2), at(3)]);
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_value(0.125), 0.13);
        assert_eq!(round_value(-0.125), -0.13);
        assert_eq!(round_value(12.3456), 12.35);
        assert_eq!(round_value(9.5), 9.5);

        let history = HistoryWindow::new(vec![ice(NAC, 1, 0.125)]);
        let set = align(&history, &default_locations(), &ice_only());
        assert_eq!(
            set.series(&Location::new(NAC), Metric::AvgIceThickness)
                .unwrap(),
            &[Some(0.13)]
        );
    }

    #[test]
    fn test_non_finite_values_are_gaps() {
        let history = HistoryWindow::new(vec![ice(NAC, 1, f64::NAN)]);
        let set = align(&history, &default_locations(), &ice_only());
        assert_eq!(
            set.series(&Location::new(NAC), Metric::AvgIceThickness)
                .unwrap(),
            &[None]
        );
    }

    #[test]
    fn test_rounding_happens_on_scaled_binary_value() {
        assert_eq!(round_value(2.675), 2.68);
        assert_eq!(round_value(1.005), 1.0);
    }

    #[test]
    fn test_huge_finite_value_is_kept() {
        assert_eq!(round_value(1e307), 1e307);
        assert_eq!(round_value(-f64::MAX), -f64::MAX);

        let history = HistoryWindow::new(vec![ice(NAC, 1, 1e307)]);
        let set = align(&history, &default_locations(), &ice_only());
        let values = set
            .series(&Location::new(NAC), Metric::AvgIceThickness)
            .unwrap();
        assert_eq!(values, &[Some(1e307)]);

        let json = serde_json::to_value(values).unwrap();
        assert_eq!(json, serde_json::json!([1e307]));
    }

    #[test]
    fn test_unconfigured_location_extends_axis_only() {
        let history = HistoryWindow::new(vec![ice("Hog's Back", 1, 5.0), ice(NAC, 2, 6.0)]);

        let set = align(&history, &default_locations(), &ice_only());
        assert_eq!(set.axis, vec![at(1), at(2)]);
        assert!(set
            .series(&Location::new("Hog's Back"), Metric::AvgIceThickness)
            .is_none());
        assert_eq!(
            set.series(&Location::new(NAC), Metric::AvgIceThickness)
                .unwrap(),
            &[None, Some(6.0)]
        );
    }
}
