//! Gridded forecast fields.
//!
//! A [`GriddedField`] is a regular lon/lat grid, optionally stacked over
//! forecast time steps, with the metadata the chart products annotate with.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{ChartError, ChartResult, ForecastTime};

/// Physical kind of a gridded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Accumulated precipitation (mm)
    Precipitation,
    /// Snowfall water equivalent (mm)
    Snow,
    /// Sleet / mixed precipitation (mm)
    Sleet,
    /// Geopotential height (dagpm)
    GeopotentialHeight,
    /// Mean sea-level pressure (hPa)
    SeaLevelPressure,
}

impl FieldKind {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Precipitation => "rain",
            FieldKind::Snow => "snow",
            FieldKind::Sleet => "sleet",
            FieldKind::GeopotentialHeight => "gh",
            FieldKind::SeaLevelPressure => "mslp",
        }
    }

    /// Precipitation-type fields are masked below a threshold and carry an
    /// accumulation period.
    pub fn is_precipitation_type(&self) -> bool {
        matches!(
            self,
            FieldKind::Precipitation | FieldKind::Snow | FieldKind::Sleet
        )
    }
}

/// Forecast metadata attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Model name, e.g. "ECMWF"
    #[serde(default)]
    pub model: Option<String>,
    /// Accumulation period in hours
    #[serde(default)]
    pub accumulation_hours: Option<u32>,
    /// Spacing between time steps in hours
    #[serde(default)]
    pub time_gap_hours: Option<u32>,
    /// Pressure level (hPa)
    #[serde(default)]
    pub level_hpa: Option<f64>,
    /// Model initialisation time
    #[serde(default)]
    pub reference_time: Option<NaiveDateTime>,
    /// Lead hours, one per time step
    #[serde(default)]
    pub forecast_periods: Vec<f64>,
}

fn default_steps() -> usize {
    1
}

/// A regular lon/lat grid of values, row-major `[step][lat][lon]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedField {
    pub kind: FieldKind,
    /// Longitude axis (degrees), monotonic
    pub lon: Vec<f64>,
    /// Latitude axis (degrees), monotonic (ascending or descending)
    pub lat: Vec<f64>,
    /// Number of time steps stacked in `data`
    #[serde(default = "default_steps")]
    pub steps: usize,
    pub data: Vec<f32>,
    #[serde(default)]
    pub meta: FieldMeta,
}

impl GriddedField {
    /// Create a field, checking the shape invariant.
    pub fn new(
        kind: FieldKind,
        lon: Vec<f64>,
        lat: Vec<f64>,
        steps: usize,
        data: Vec<f32>,
        meta: FieldMeta,
    ) -> ChartResult<Self> {
        let field = Self {
            kind,
            lon,
            lat,
            steps,
            data,
            meta,
        };
        field.validate()?;
        Ok(field)
    }

    /// Check that the axes match the payload's last two dimensions.
    pub fn validate(&self) -> ChartResult<()> {
        let name = self.kind.name();
        if self.lon.len() < 2 || self.lat.len() < 2 {
            return Err(ChartError::ShapeMismatch(format!(
                "{}: axes need at least 2 points, got {}x{}",
                name,
                self.lon.len(),
                self.lat.len()
            )));
        }
        let expected = self.steps * self.lat.len() * self.lon.len();
        if self.data.len() != expected {
            return Err(ChartError::ShapeMismatch(format!(
                "{}: data has {} values, axes describe {} steps x {} lat x {} lon = {}",
                name,
                self.data.len(),
                self.steps,
                self.lat.len(),
                self.lon.len(),
                expected
            )));
        }
        if !is_monotonic(&self.lon) || !is_monotonic(&self.lat) {
            return Err(ChartError::ShapeMismatch(format!(
                "{}: coordinate axes must be strictly monotonic",
                name
            )));
        }
        if !self.meta.forecast_periods.is_empty()
            && self.steps > 1
            && self.meta.forecast_periods.len() != self.steps
        {
            return Err(ChartError::ShapeMismatch(format!(
                "{}: {} forecast periods for {} time steps",
                name,
                self.meta.forecast_periods.len(),
                self.steps
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Grid width (longitude points).
    pub fn nx(&self) -> usize {
        self.lon.len()
    }

    /// Grid height (latitude points).
    pub fn ny(&self) -> usize {
        self.lat.len()
    }

    /// Values of one time step.
    pub fn step(&self, index: usize) -> Option<&[f32]> {
        if index >= self.steps {
            return None;
        }
        let size = self.nx() * self.ny();
        self.data.get(index * size..(index + 1) * size)
    }

    /// A single-step copy of step `index`, keeping that step's forecast period.
    pub fn slice_step(&self, index: usize) -> ChartResult<GriddedField> {
        let values = self.step(index).ok_or_else(|| {
            ChartError::ShapeMismatch(format!(
                "{}: step {} requested from {} steps",
                self.name(),
                index,
                self.steps
            ))
        })?;
        let mut meta = self.meta.clone();
        meta.forecast_periods = self
            .meta
            .forecast_periods
            .get(index)
            .map(|&p| vec![p])
            .unwrap_or_default();
        Ok(GriddedField {
            kind: self.kind,
            lon: self.lon.clone(),
            lat: self.lat.clone(),
            steps: 1,
            data: values.to_vec(),
            meta,
        })
    }

    // === Mandatory attributes ===

    pub fn model(&self) -> ChartResult<&str> {
        self.meta
            .model
            .as_deref()
            .ok_or_else(|| ChartError::missing(self.name(), "model"))
    }

    pub fn accumulation_hours(&self) -> ChartResult<u32> {
        self.meta
            .accumulation_hours
            .ok_or_else(|| ChartError::missing(self.name(), "accumulation_hours"))
    }

    pub fn time_gap_hours(&self) -> ChartResult<u32> {
        self.meta
            .time_gap_hours
            .ok_or_else(|| ChartError::missing(self.name(), "time_gap_hours"))
    }

    pub fn reference_time(&self) -> ChartResult<NaiveDateTime> {
        self.meta
            .reference_time
            .ok_or_else(|| ChartError::missing(self.name(), "reference_time"))
    }

    /// Forecast time of step `index`.
    pub fn forecast_time(&self, index: usize) -> ChartResult<ForecastTime> {
        let reference = self.reference_time()?;
        let lead = self
            .meta
            .forecast_periods
            .get(index)
            .copied()
            .ok_or_else(|| ChartError::missing(self.name(), "forecast_periods"))?;
        Ok(ForecastTime::new(reference, lead))
    }

    /// Forecast times of every step, in step order.
    pub fn forecast_times(&self) -> ChartResult<Vec<ForecastTime>> {
        (0..self.steps).map(|i| self.forecast_time(i)).collect()
    }

    // === Grid lookup ===

    /// Fractional column index of a longitude, trying the ±360° aliases.
    pub fn lon_position(&self, lon: f64) -> Option<f64> {
        [lon, lon + 360.0, lon - 360.0]
            .iter()
            .find_map(|&l| axis_position(&self.lon, l))
    }

    /// Fractional row index of a latitude.
    pub fn lat_position(&self, lat: f64) -> Option<f64> {
        axis_position(&self.lat, lat)
    }

    /// Value of the grid cell whose centre is nearest to (lon, lat).
    pub fn sample_nearest(&self, step: usize, lon: f64, lat: f64) -> Option<f32> {
        let values = self.step(step)?;
        let i = self.lon_position(lon)?.round() as usize;
        let j = self.lat_position(lat)?.round() as usize;
        values.get(j * self.nx() + i.min(self.nx() - 1)).copied()
    }

    /// Bilinear interpolation at (lon, lat). NaN corners propagate.
    pub fn sample_bilinear(&self, step: usize, lon: f64, lat: f64) -> Option<f32> {
        let values = self.step(step)?;
        let x = self.lon_position(lon)?;
        let y = self.lat_position(lat)?;
        let nx = self.nx();

        let x1 = x.floor() as usize;
        let y1 = y.floor() as usize;
        let x2 = (x1 + 1).min(nx - 1);
        let y2 = (y1 + 1).min(self.ny() - 1);
        let dx = (x - x1 as f64) as f32;
        let dy = (y - y1 as f64) as f32;

        let v11 = values[y1 * nx + x1];
        let v21 = values[y1 * nx + x2];
        let v12 = values[y2 * nx + x1];
        let v22 = values[y2 * nx + x2];

        let v1 = v11 * (1.0 - dx) + v21 * dx;
        let v2 = v12 * (1.0 - dx) + v22 * dx;
        Some(v1 * (1.0 - dy) + v2 * dy)
    }

    /// Convert fractional grid indices (column, row) to (lon, lat).
    pub fn index_to_lonlat(&self, i: f64, j: f64) -> (f64, f64) {
        (axis_value(&self.lon, i), axis_value(&self.lat, j))
    }

    /// Minimum and maximum of the finite values of a step.
    pub fn value_range(&self, step: usize) -> Option<(f32, f32)> {
        let values = self.step(step)?;
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        (min <= max).then_some((min, max))
    }
}

fn is_monotonic(axis: &[f64]) -> bool {
    let ascending = axis.windows(2).all(|w| w[1] > w[0]);
    let descending = axis.windows(2).all(|w| w[1] < w[0]);
    ascending || descending
}

/// Fractional index of `value` on a monotonic axis, or None when outside it.
fn axis_position(axis: &[f64], value: f64) -> Option<f64> {
    let n = axis.len();
    if n < 2 || !value.is_finite() {
        return None;
    }
    let ascending = axis[n - 1] > axis[0];
    let (lo, hi) = if ascending {
        (axis[0], axis[n - 1])
    } else {
        (axis[n - 1], axis[0])
    };
    if value < lo || value > hi {
        return None;
    }

    // First index whose coordinate has passed `value`
    let upper = if ascending {
        axis.partition_point(|&a| a < value)
    } else {
        axis.partition_point(|&a| a > value)
    };
    if upper == 0 {
        return Some(0.0);
    }
    let upper = upper.min(n - 1);
    let lower = upper - 1;
    let span = axis[upper] - axis[lower];
    let t = if span.abs() < f64::EPSILON {
        0.0
    } else {
        (value - axis[lower]) / span
    };
    Some(lower as f64 + t.clamp(0.0, 1.0))
}

/// Coordinate at a fractional index, linear between axis points.
fn axis_value(axis: &[f64], index: f64) -> f64 {
    let n = axis.len();
    let index = index.clamp(0.0, (n - 1) as f64);
    let lower = (index.floor() as usize).min(n - 2);
    let t = index - lower as f64;
    axis[lower] + t * (axis[lower + 1] - axis[lower])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_field(steps: usize) -> GriddedField {
        let lon = vec![100.0, 101.0, 102.0];
        let lat = vec![40.0, 39.0];
        let data = (0..steps * 6).map(|v| v as f32).collect();
        GriddedField::new(
            FieldKind::Precipitation,
            lon,
            lat,
            steps,
            data,
            FieldMeta::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = GriddedField::new(
            FieldKind::Snow,
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            1,
            vec![0.0; 5],
            FieldMeta::default(),
        );
        assert!(matches!(result, Err(ChartError::ShapeMismatch(_))));
    }

    #[test]
    fn test_step_slices() {
        let field = small_field(2);
        assert_eq!(field.step(0).unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(field.step(1).unwrap()[0], 6.0);
        assert!(field.step(2).is_none());
    }

    #[test]
    fn test_slice_step_keeps_period() {
        let mut field = small_field(3);
        field.meta.forecast_periods = vec![6.0, 12.0, 18.0];
        let slice = field.slice_step(1).unwrap();
        assert_eq!(slice.steps, 1);
        assert_eq!(slice.data[0], 6.0);
        assert_eq!(slice.meta.forecast_periods, vec![12.0]);
        assert!(field.slice_step(3).is_err());
    }

    #[test]
    fn test_descending_latitude_position() {
        let field = small_field(1);
        assert_eq!(field.lat_position(40.0), Some(0.0));
        assert_eq!(field.lat_position(39.5), Some(0.5));
        assert_eq!(field.lat_position(39.0), Some(1.0));
        assert_eq!(field.lat_position(41.0), None);
    }

    #[test]
    fn test_longitude_alias() {
        let mut field = small_field(1);
        field.lon = vec![250.0, 251.0, 252.0];
        assert_eq!(field.lon_position(-109.0), Some(1.0));
    }

    #[test]
    fn test_bilinear_center() {
        let field = small_field(1);
        let v = field.sample_bilinear(0, 100.5, 39.5).unwrap();
        // mean of 0, 1, 3, 4
        assert!((v - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_sample() {
        let field = small_field(1);
        assert_eq!(field.sample_nearest(0, 101.9, 39.1), Some(5.0));
    }

    #[test]
    fn test_missing_model_is_error() {
        let field = small_field(1);
        let err = field.model().unwrap_err();
        assert!(matches!(err, ChartError::MissingAttribute { .. }));
    }

    #[test]
    fn test_index_to_lonlat() {
        let field = small_field(1);
        assert_eq!(field.index_to_lonlat(1.5, 0.5), (101.5, 39.5));
    }
}
