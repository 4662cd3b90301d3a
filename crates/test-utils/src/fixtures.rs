//! Common test fixtures for chart tests.
//!
//! This module provides pre-defined extents, times and metadata that
//! represent common chart scenarios.

use chart_common::{FieldMeta, MapExtent};
use chrono::{NaiveDate, NaiveDateTime};

/// Common map extents for testing.
pub mod extents {
    use chart_common::MapExtent;

    /// The default East Asia chart window.
    pub const EAST_ASIA: MapExtent = MapExtent {
        min_lon: 50.0,
        max_lon: 150.0,
        min_lat: 0.0,
        max_lat: 65.0,
    };

    /// A provincial window; narrow enough for small-city labelling.
    pub const JIANGNAN: MapExtent = MapExtent {
        min_lon: 110.0,
        max_lon: 125.0,
        min_lat: 25.0,
        max_lat: 38.0,
    };

    /// Whole earth, for the Robinson charts.
    pub const GLOBAL: MapExtent = MapExtent {
        min_lon: 0.0,
        max_lon: 360.0,
        min_lat: -90.0,
        max_lat: 90.0,
    };
}

/// Common time values for testing.
pub mod time {
    /// Model runs of the operational centres
    pub const CYCLES: [u32; 2] = [8, 20];

    /// Common forecast leads (hours)
    pub const FORECAST_HOURS: [f64; 6] = [6.0, 12.0, 24.0, 36.0, 48.0, 72.0];
}

/// A fixed model reference time for tests (2024-01-15 08:00).
pub fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid fixture date")
}

/// Complete metadata of a single-step field.
pub fn forecast_meta(accumulation_hours: u32, lead_hours: f64) -> FieldMeta {
    FieldMeta {
        model: Some("ECMWF".to_string()),
        accumulation_hours: Some(accumulation_hours),
        time_gap_hours: None,
        level_hpa: None,
        reference_time: Some(reference_time()),
        forecast_periods: vec![lead_hours],
    }
}

/// Complete metadata of an evolution field with `steps` steps `t_gap` hours apart.
pub fn evolution_meta(steps: usize, t_gap: u32) -> FieldMeta {
    FieldMeta {
        model: Some("ECMWF".to_string()),
        accumulation_hours: Some(t_gap),
        time_gap_hours: Some(t_gap),
        level_hpa: None,
        reference_time: Some(reference_time()),
        forecast_periods: (1..=steps).map(|i| (i as u32 * t_gap) as f64).collect(),
    }
}

/// Extent covering the whole of `extent`, padded by `margin` degrees.
pub fn padded(extent: &MapExtent, margin: f64) -> MapExtent {
    MapExtent {
        min_lon: extent.min_lon - margin,
        max_lon: extent.max_lon + margin,
        min_lat: (extent.min_lat - margin).max(-90.0),
        max_lat: (extent.max_lat + margin).min(90.0),
    }
}
