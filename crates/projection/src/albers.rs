//! Albers Equal-Area Conic projection (spherical form).
//!
//! Used for regional charts. The cone is secant to the sphere at the two
//! standard parallels; areas are preserved everywhere.
//!
//! The projection parameters include:
//! - Central meridian (lon0)
//! - Latitude of origin (lat0): projected y = 0 on the central meridian
//! - Standard parallels: sp1 and sp2

use std::f64::consts::PI;

use crate::{wrap_radians, Projection, EARTH_RADIUS};

/// Albers Equal-Area projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbersEqualArea {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub sp1: f64,
    /// Second standard parallel in radians
    pub sp2: f64,
    /// Sphere radius (meters)
    pub earth_radius: f64,
    /// Cone constant (n)
    n: f64,
    /// C constant
    c: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl AlbersEqualArea {
    /// Create a new projection from degrees.
    pub fn new(lon0_deg: f64, lat0_deg: f64, sp1_deg: f64, sp2_deg: f64) -> Self {
        let to_rad = PI / 180.0;
        let lon0 = lon0_deg * to_rad;
        let lat0 = lat0_deg * to_rad;
        let sp1 = sp1_deg * to_rad;
        let sp2 = sp2_deg * to_rad;
        let earth_radius = EARTH_RADIUS;

        // Tangent cone when the parallels coincide
        let n = if (sp1 - sp2).abs() < 1e-10 {
            sp1.sin()
        } else {
            (sp1.sin() + sp2.sin()) / 2.0
        };
        let c = sp1.cos().powi(2) + 2.0 * n * sp1.sin();
        let rho0 = earth_radius * (c - 2.0 * n * lat0.sin()).max(0.0).sqrt() / n;

        Self {
            lon0,
            lat0,
            sp1,
            sp2,
            earth_radius,
            n,
            c,
            rho0,
        }
    }

    pub fn lon0_deg(&self) -> f64 {
        self.lon0.to_degrees()
    }

    pub fn lat0_deg(&self) -> f64 {
        self.lat0.to_degrees()
    }

    fn rho(&self, lat: f64) -> f64 {
        self.earth_radius * (self.c - 2.0 * self.n * lat.sin()).max(0.0).sqrt() / self.n
    }
}

impl Projection for AlbersEqualArea {
    fn forward(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        if !lon_deg.is_finite() || !(-90.0..=90.0).contains(&lat_deg) {
            return None;
        }
        let lat = lat_deg.to_radians();
        let dlon = wrap_radians(lon_deg.to_radians() - self.lon0);

        let rho = self.rho(lat);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dy = self.rho0 - y;
        let (rho, theta) = if self.n < 0.0 {
            (-(x * x + dy * dy).sqrt(), (-x).atan2(-dy))
        } else {
            ((x * x + dy * dy).sqrt(), x.atan2(dy))
        };

        let dlon = theta / self.n;
        if dlon.abs() > PI {
            return None;
        }

        let q = rho * self.n / self.earth_radius;
        let sin_lat = (self.c - q * q) / (2.0 * self.n);
        if !(-1.0..=1.0).contains(&sin_lat) {
            return None;
        }

        let lat = sin_lat.asin();
        let lon = wrap_radians(self.lon0 + dlon);
        Some((lon.to_degrees(), lat.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn china() -> AlbersEqualArea {
        AlbersEqualArea::new(100.0, 32.5, 30.0, 60.0)
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = china();
        let (x, y) = proj.forward(100.0, 32.5).unwrap();
        assert!(x.abs() < 1e-6, "x should be ~0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be ~0, got {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = china();
        for &(lon, lat) in &[(116.4, 39.9), (87.6, 43.8), (121.5, 25.0), (60.0, 5.0)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon roundtrip failed: {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat roundtrip failed: {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_east_is_positive_x_north_is_positive_y() {
        let proj = china();
        let (x_east, _) = proj.forward(110.0, 32.5).unwrap();
        let (_, y_north) = proj.forward(100.0, 40.0).unwrap();
        assert!(x_east > 0.0);
        assert!(y_north > 0.0);
    }

    #[test]
    fn test_inverse_outside_domain() {
        let proj = china();
        assert!(proj.inverse(1.0e9, 1.0e9).is_none());
    }
}
