//! Mapping between projected coordinates and figure pixels.

use chart_common::{ChartError, ChartResult, MapExtent};
use tracing::debug;

use crate::{MapProjection, Projection};

/// Samples per edge when projecting extent boundaries
const BOUNDARY_SAMPLES: usize = 64;

/// A rectangle in figure pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle from matplotlib-style figure fractions `[left, bottom, width, height]`
    /// (origin at the bottom-left) on a figure of `fig_width` x `fig_height` pixels.
    pub fn from_fractions(fractions: [f64; 4], fig_width: f64, fig_height: f64) -> Self {
        let [left, bottom, width, height] = fractions;
        Self {
            x: left * fig_width,
            y: (1.0 - bottom - height) * fig_height,
            width: width * fig_width,
            height: height * fig_height,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

/// Projected window drawn into a pixel rectangle.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub projection: MapProjection,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub rect: PixelRect,
}

impl Viewport {
    /// Projected (x, y) to pixel coordinates.
    pub fn projected_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = self.rect.x + (x - self.x_min) / (self.x_max - self.x_min) * self.rect.width;
        let py = self.rect.y + (self.y_max - y) / (self.y_max - self.y_min) * self.rect.height;
        (px, py)
    }

    /// Pixel coordinates to projected (x, y).
    pub fn pixel_to_projected(&self, px: f64, py: f64) -> (f64, f64) {
        let x = self.x_min + (px - self.rect.x) / self.rect.width * (self.x_max - self.x_min);
        let y = self.y_max - (py - self.rect.y) / self.rect.height * (self.y_max - self.y_min);
        (x, y)
    }

    /// (lon, lat) to pixel coordinates.
    pub fn geo_to_pixel(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (x, y) = self.projection.forward(lon, lat)?;
        Some(self.projected_to_pixel(x, y))
    }

    /// Pixel coordinates to (lon, lat), or None outside the projection's domain.
    pub fn pixel_to_geo(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        let (x, y) = self.pixel_to_projected(px, py);
        self.projection.inverse(x, y)
    }
}

/// Fit `extent` into `rect` without distorting the projection.
///
/// The projected bounds of the requested extent are widened along the short
/// axis until they match the rectangle's aspect ratio. Returns the viewport
/// and the realised geographic extent, which always contains the request.
pub fn adjust_map_ratio(
    projection: MapProjection,
    extent: &MapExtent,
    rect: PixelRect,
) -> ChartResult<(Viewport, MapExtent)> {
    extent.validate()?;
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return Err(ChartError::InvalidConfig(format!(
            "plot area must have a positive size, got {}x{}",
            rect.width, rect.height
        )));
    }

    let (x_min, x_max, y_min, y_max) = if extent.lon_span() >= 359.9 {
        match projection.world_bounds() {
            Some(bounds) => bounds,
            None => projected_bounds(&projection, extent)?,
        }
    } else {
        projected_bounds(&projection, extent)?
    };

    // Expand the short side around the centre
    let (cx, cy) = ((x_min + x_max) / 2.0, (y_min + y_max) / 2.0);
    let (mut half_w, mut half_h) = ((x_max - x_min) / 2.0, (y_max - y_min) / 2.0);
    let target = rect.aspect();
    if half_w / half_h < target {
        half_w = half_h * target;
    } else {
        half_h = half_w / target;
    }

    let viewport = Viewport {
        projection,
        x_min: cx - half_w,
        x_max: cx + half_w,
        y_min: cy - half_h,
        y_max: cy + half_h,
        rect,
    };

    let realised = realised_extent(&viewport, extent);
    debug!(
        projection = viewport.projection.name(),
        requested = ?extent,
        realised = ?realised,
        "Adjusted map ratio"
    );

    Ok((viewport, realised))
}

fn projected_bounds(
    projection: &MapProjection,
    extent: &MapExtent,
) -> ChartResult<(f64, f64, f64, f64)> {
    let mut bounds = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    let mut any = false;
    for (lon, lat) in extent.boundary_points(BOUNDARY_SAMPLES) {
        if let Some((x, y)) = projection.forward(lon, lat) {
            bounds.0 = bounds.0.min(x);
            bounds.1 = bounds.1.max(x);
            bounds.2 = bounds.2.min(y);
            bounds.3 = bounds.3.max(y);
            any = true;
        }
    }
    if !any || bounds.1 <= bounds.0 || bounds.3 <= bounds.2 {
        return Err(ChartError::InvalidExtent(format!(
            "{:?} cannot be projected with {}",
            extent,
            projection.name()
        )));
    }
    Ok(bounds)
}

/// Geographic bounds of the viewport window, unioned with the requested extent.
fn realised_extent(viewport: &Viewport, requested: &MapExtent) -> MapExtent {
    let mut realised = *requested;
    let n = BOUNDARY_SAMPLES;
    let rect = viewport.rect;
    for k in 0..=n {
        let t = k as f64 / n as f64;
        let edge_points = [
            (rect.x + t * rect.width, rect.y),
            (rect.x + t * rect.width, rect.bottom()),
            (rect.x, rect.y + t * rect.height),
            (rect.right(), rect.y + t * rect.height),
        ];
        for (px, py) in edge_points {
            if let Some((mut lon, lat)) = viewport.pixel_to_geo(px, py) {
                // Keep longitudes on the same branch as the request
                let (center_lon, _) = requested.center();
                while lon - center_lon > 180.0 {
                    lon -= 360.0;
                }
                while lon - center_lon < -180.0 {
                    lon += 360.0;
                }
                realised.min_lon = realised.min_lon.min(lon);
                realised.max_lon = realised.max_lon.max(lon);
                realised.min_lat = realised.min_lat.min(lat);
                realised.max_lat = realised.max_lat.max(lat);
            }
        }
    }
    realised
}
