//! Robinson pseudo-cylindrical projection.
//!
//! Defined by a table of parallel lengths and distances from the equator at
//! 5° intervals; values in between are linearly interpolated.

use std::f64::consts::PI;

use crate::{wrap_radians, Projection, EARTH_RADIUS};

/// Parallel length (X) at 0°, 5°, ..., 90°
const PLEN: [f64; 19] = [
    1.0000, 0.9986, 0.9954, 0.9900, 0.9822, 0.9730, 0.9600, 0.9427, 0.9216, 0.8962, 0.8679,
    0.8350, 0.7986, 0.7597, 0.7186, 0.6732, 0.6213, 0.5722, 0.5322,
];

/// Distance of the parallel from the equator (Y) at 0°, 5°, ..., 90°
const PDFE: [f64; 19] = [
    0.0000, 0.0620, 0.1240, 0.1860, 0.2480, 0.3100, 0.3720, 0.4340, 0.4958, 0.5571, 0.6176,
    0.6769, 0.7346, 0.7903, 0.8435, 0.8936, 0.9394, 0.9761, 1.0000,
];

const X_SCALE: f64 = 0.8487;
const Y_SCALE: f64 = 1.3523;

/// Robinson projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Robinson {
    /// Central meridian in radians
    pub lon0: f64,
    /// Sphere radius (meters)
    pub earth_radius: f64,
}

impl Robinson {
    pub fn new(central_longitude_deg: f64) -> Self {
        Self {
            lon0: central_longitude_deg.to_radians(),
            earth_radius: EARTH_RADIUS,
        }
    }

    pub fn central_longitude_deg(&self) -> f64 {
        self.lon0.to_degrees()
    }
}

/// Interpolate a table at |lat| in degrees.
fn table_at(table: &[f64; 19], abs_lat_deg: f64) -> f64 {
    let pos = (abs_lat_deg / 5.0).clamp(0.0, 18.0);
    let i = (pos.floor() as usize).min(17);
    let t = pos - i as f64;
    table[i] + t * (table[i + 1] - table[i])
}

/// Inverse of the PDFE table: |lat| in degrees for a normalized Y.
fn lat_for_pdfe(y_norm: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&y_norm) {
        return None;
    }
    let upper = PDFE.partition_point(|&v| v < y_norm).clamp(1, 18);
    let lower = upper - 1;
    let t = (y_norm - PDFE[lower]) / (PDFE[upper] - PDFE[lower]);
    Some((lower as f64 + t) * 5.0)
}

impl Projection for Robinson {
    fn forward(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        if !lon_deg.is_finite() || !(-90.0..=90.0).contains(&lat_deg) {
            return None;
        }
        let dlon = wrap_radians(lon_deg.to_radians() - self.lon0);
        let abs_lat = lat_deg.abs();

        let x = X_SCALE * self.earth_radius * table_at(&PLEN, abs_lat) * dlon;
        let y = Y_SCALE * self.earth_radius * table_at(&PDFE, abs_lat) * lat_deg.signum();
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let y_norm = y / (Y_SCALE * self.earth_radius);
        let abs_lat = lat_for_pdfe(y_norm.abs())?;

        let plen = table_at(&PLEN, abs_lat);
        let dlon = x / (X_SCALE * self.earth_radius * plen);
        if dlon.abs() > PI + 1e-12 {
            return None;
        }

        let lon = wrap_radians(self.lon0 + dlon).to_degrees();
        Some((lon, abs_lat * y_norm.signum()))
    }

    fn world_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let half_width = X_SCALE * self.earth_radius * PI;
        let half_height = Y_SCALE * self.earth_radius;
        Some((-half_width, half_width, -half_height, half_height))
    }
}
