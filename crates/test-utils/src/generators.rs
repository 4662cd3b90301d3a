//! Test data generators for creating synthetic forecast fields.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite: smooth blobs of rain, a height field with a trough,
//! a pressure high, and multi-step precipitation that grows over time.

use chart_common::{FieldKind, GriddedField, MapExtent};

use crate::fixtures::{evolution_meta, forecast_meta};

/// Evenly spaced axis of `n` points from `start` to `end` inclusive.
pub fn linear_axis(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Longitude and latitude axes covering an extent (latitude descending, as
/// model output usually is).
pub fn extent_axes(extent: &MapExtent, nx: usize, ny: usize) -> (Vec<f64>, Vec<f64>) {
    (
        linear_axis(extent.min_lon, extent.max_lon, nx),
        linear_axis(extent.max_lat, extent.min_lat, ny),
    )
}

/// Creates a grid with a Gaussian bump of `peak` centred at (`cx`, `cy`)
/// in grid index space with a radius of `sigma` cells.
pub fn create_blob_grid(
    width: usize,
    height: usize,
    cx: f32,
    cy: f32,
    sigma: f32,
    peak: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - cx;
            let dy = row as f32 - cy;
            data.push(peak * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp());
        }
    }
    data
}

/// Creates a grid with random-ish but deterministic precipitation values.
///
/// Most values are 0 (no precipitation), some are up to 50 mm.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let precip = if hash % 4 == 0 {
                (hash % 5000) as f32 / 100.0
            } else {
                0.0
            };
            data.push(precip);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Single-step precipitation-type field with a 60 mm blob in the middle of
/// the extent; 24 h accumulation valid at lead 24 h.
pub fn precipitation_field(kind: FieldKind, extent: &MapExtent, nx: usize, ny: usize) -> GriddedField {
    let (lon, lat) = extent_axes(extent, nx, ny);
    let data = create_blob_grid(
        nx,
        ny,
        nx as f32 / 2.0,
        ny as f32 / 2.0,
        nx.min(ny) as f32 / 6.0,
        60.0,
    );
    GriddedField::new(kind, lon, lat, 1, data, forecast_meta(24, 24.0))
        .expect("generated precipitation field is consistent")
}

/// 500 hPa geopotential height (dagpm): decreasing poleward with a trough.
pub fn height_field(extent: &MapExtent, nx: usize, ny: usize) -> GriddedField {
    let (lon, lat) = extent_axes(extent, nx, ny);
    let mut data = Vec::with_capacity(nx * ny);
    let (center_lon, _) = extent.center();
    for &la in &lat {
        for &lo in &lon {
            let trough = 8.0 * (-(lo - center_lon).powi(2) / 200.0).exp();
            data.push((592.0 - 0.9 * (la - extent.min_lat) - trough) as f32);
        }
    }
    let mut meta = forecast_meta(24, 24.0);
    meta.accumulation_hours = None;
    meta.level_hpa = Some(500.0);
    GriddedField::new(FieldKind::GeopotentialHeight, lon, lat, 1, data, meta)
        .expect("generated height field is consistent")
}

/// Sea-level pressure (hPa) with a 1030 hPa high centred in the extent.
pub fn pressure_field(extent: &MapExtent, nx: usize, ny: usize) -> GriddedField {
    let (lon, lat) = extent_axes(extent, nx, ny);
    let data: Vec<f32> = create_blob_grid(
        nx,
        ny,
        nx as f32 / 2.0,
        ny as f32 / 2.0,
        nx.min(ny) as f32 / 4.0,
        22.0,
    )
    .into_iter()
    .map(|v| v + 1008.0)
    .collect();
    let mut meta = forecast_meta(24, 24.0);
    meta.accumulation_hours = None;
    GriddedField::new(FieldKind::SeaLevelPressure, lon, lat, 1, data, meta)
        .expect("generated pressure field is consistent")
}

/// Multi-step accumulated precipitation: a rain area drifting east and
/// growing with every step.
pub fn evolution_field(
    extent: &MapExtent,
    nx: usize,
    ny: usize,
    steps: usize,
    t_gap: u32,
) -> GriddedField {
    let (lon, lat) = extent_axes(extent, nx, ny);
    let mut data = Vec::with_capacity(steps * nx * ny);
    for step in 0..steps {
        let cx = nx as f32 * (0.3 + 0.4 * step as f32 / steps.max(1) as f32);
        let peak = 20.0 * (step + 1) as f32;
        data.extend(create_blob_grid(
            nx,
            ny,
            cx,
            ny as f32 / 2.0,
            nx.min(ny) as f32 / 8.0,
            peak,
        ));
    }
    GriddedField::new(
        FieldKind::Precipitation,
        lon,
        lat,
        steps,
        data,
        evolution_meta(steps, t_gap),
    )
    .expect("generated evolution field is consistent")
}
