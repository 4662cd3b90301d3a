//! Geographic map extent.

use serde::{Deserialize, Serialize};

use crate::{ChartError, ChartResult};

/// A lon/lat rectangle bounding the plotted region, in degrees.
///
/// Stored in the `(min_lon, max_lon, min_lat, max_lat)` order used by the
/// chart products.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapExtent {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Default for MapExtent {
    fn default() -> Self {
        Self {
            min_lon: 50.0,
            max_lon: 150.0,
            min_lat: 0.0,
            max_lat: 65.0,
        }
    }
}

impl MapExtent {
    /// Create an extent, checking `min < max` on both axes.
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> ChartResult<Self> {
        let extent = Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        };
        extent.validate()?;
        Ok(extent)
    }

    /// Parse an extent string: "minlon,maxlon,minlat,maxlat"
    pub fn from_arg_string(s: &str) -> ChartResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ChartError::InvalidExtent(format!(
                "{s}. Expected 'minlon,maxlon,minlat,maxlat'"
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| ChartError::InvalidExtent(format!("invalid number '{part}'")))?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn validate(&self) -> ChartResult<()> {
        let all_finite = [self.min_lon, self.max_lon, self.min_lat, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ChartError::InvalidExtent(format!("{:?} has non-finite bounds", self)));
        }
        if self.min_lon >= self.max_lon {
            return Err(ChartError::InvalidExtent(format!(
                "min_lon {} must be below max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(ChartError::InvalidExtent(format!(
                "min_lat {} must be below max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(ChartError::InvalidExtent(format!(
                "latitudes must lie within -90..90, got {}..{}",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    /// Longitude span in degrees.
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Centre point as (lon, lat).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Check if a point is contained within this extent.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if `other` lies entirely inside this extent (with a small tolerance).
    pub fn contains_extent(&self, other: &MapExtent) -> bool {
        const EPS: f64 = 1e-6;
        self.min_lon <= other.min_lon + EPS
            && self.max_lon >= other.max_lon - EPS
            && self.min_lat <= other.min_lat + EPS
            && self.max_lat >= other.max_lat - EPS
    }

    /// Points along the boundary, `per_edge` samples per edge, counter-clockwise
    /// from the south-west corner.
    pub fn boundary_points(&self, per_edge: usize) -> Vec<(f64, f64)> {
        let n = per_edge.max(1);
        let mut points = Vec::with_capacity(n * 4);
        for k in 0..n {
            let t = k as f64 / n as f64;
            points.push((self.min_lon + t * self.lon_span(), self.min_lat));
        }
        for k in 0..n {
            let t = k as f64 / n as f64;
            points.push((self.max_lon, self.min_lat + t * self.lat_span()));
        }
        for k in 0..n {
            let t = k as f64 / n as f64;
            points.push((self.max_lon - t * self.lon_span(), self.max_lat));
        }
        for k in 0..n {
            let t = k as f64 / n as f64;
            points.push((self.min_lon, self.max_lat - t * self.lat_span()));
        }
        points
    }
}
