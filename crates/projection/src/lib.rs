//! Map projections for chart rendering.
//!
//! Implements the projections the chart products use from scratch, plus the
//! viewport that maps projected coordinates onto the figure's plot area.

pub mod albers;
pub mod robinson;
pub mod viewport;

pub use albers::AlbersEqualArea;
pub use robinson::Robinson;
pub use viewport::{adjust_map_ratio, PixelRect, Viewport};

use chart_common::MapExtent;

/// Mean Earth radius (meters)
pub const EARTH_RADIUS: f64 = 6_371_229.0;

/// Central longitude of the whole-earth projection.
pub const GLOBAL_CENTRAL_LONGITUDE: f64 = 115.0;

/// Standard parallels of the regional projection.
pub const REGIONAL_STANDARD_PARALLELS: (f64, f64) = (30.0, 60.0);

/// Forward and inverse transform between geographic and projected coordinates.
pub trait Projection {
    /// (lon, lat) in degrees to projected (x, y) in meters.
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Projected (x, y) to (lon, lat) in degrees, or None outside the valid domain.
    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Projected bounds of the whole globe, when the projection has finite ones.
    fn world_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        None
    }
}

/// The projection a chart is drawn in.
#[derive(Debug, Clone, PartialEq)]
pub enum MapProjection {
    Albers(AlbersEqualArea),
    Robinson(Robinson),
}

impl MapProjection {
    /// Robinson centred at 115°E for global charts, otherwise Albers centred on
    /// the extent with standard parallels 30°/60°.
    pub fn for_extent(extent: &MapExtent, global: bool) -> Self {
        if global {
            MapProjection::Robinson(Robinson::new(GLOBAL_CENTRAL_LONGITUDE))
        } else {
            let (lon0, lat0) = extent.center();
            let (sp1, sp2) = REGIONAL_STANDARD_PARALLELS;
            MapProjection::Albers(AlbersEqualArea::new(lon0, lat0, sp1, sp2))
        }
    }

    /// Central meridian in degrees; the map seam lies 180° away.
    pub fn central_longitude(&self) -> f64 {
        match self {
            MapProjection::Albers(p) => p.lon0_deg(),
            MapProjection::Robinson(p) => p.central_longitude_deg(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapProjection::Albers(_) => "albers_equal_area",
            MapProjection::Robinson(_) => "robinson",
        }
    }
}

impl Projection for MapProjection {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            MapProjection::Albers(p) => p.forward(lon, lat),
            MapProjection::Robinson(p) => p.forward(lon, lat),
        }
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            MapProjection::Albers(p) => p.inverse(x, y),
            MapProjection::Robinson(p) => p.inverse(x, y),
        }
    }

    fn world_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        match self {
            MapProjection::Albers(p) => p.world_bounds(),
            MapProjection::Robinson(p) => p.world_bounds(),
        }
    }
}

/// Normalize a longitude difference (radians) to [-π, π].
pub(crate) fn wrap_radians(mut dlon: f64) -> f64 {
    use std::f64::consts::PI;
    while dlon > PI {
        dlon -= 2.0 * PI;
    }
    while dlon < -PI {
        dlon += 2.0 * PI;
    }
    dlon
}
