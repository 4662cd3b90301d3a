//! Separable Gaussian smoothing of gridded data.
//!
//! Boundary handling mirrors the grid about its edge ("reflect": the edge
//! sample is repeated), and the kernel is truncated at 4 sigma.

use rayon::prelude::*;

/// Kernel radius in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Normalised 1-D Gaussian weights for `sigma` (grid cells).
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as i64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Index into `0..n` after reflecting about the half-sample boundary.
fn reflect_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn convolve_1d(input: &[f32], output: &mut [f32], kernel: &[f64]) {
    let n = input.len();
    let radius = (kernel.len() / 2) as i64;
    for (i, out) in output.iter_mut().enumerate() {
        let mut acc = 0.0f64;
        for (k, w) in kernel.iter().enumerate() {
            let src = reflect_index(i as i64 + k as i64 - radius, n);
            acc += w * input[src] as f64;
        }
        *out = acc as f32;
    }
}

/// Gaussian filter of a row-major `width` x `height` grid.
///
/// NaN values propagate to every output cell whose kernel touches them.
pub fn gaussian_filter(data: &[f32], width: usize, height: usize, sigma: f64) -> Vec<f32> {
    if sigma <= 0.0 || width == 0 || height == 0 || data.len() != width * height {
        return data.to_vec();
    }
    let kernel = gaussian_kernel(sigma);

    // Rows
    let mut rows = vec![0.0f32; data.len()];
    rows.par_chunks_mut(width)
        .zip(data.par_chunks(width))
        .for_each(|(out, row)| convolve_1d(row, out, &kernel));

    // Columns, via a transposed copy so each column is contiguous
    let mut transposed = vec![0.0f32; data.len()];
    for y in 0..height {
        for x in 0..width {
            transposed[x * height + y] = rows[y * width + x];
        }
    }
    let mut columns = vec![0.0f32; data.len()];
    columns
        .par_chunks_mut(height)
        .zip(transposed.par_chunks(height))
        .for_each(|(out, col)| convolve_1d(col, out, &kernel));

    let mut result = vec![0.0f32; data.len()];
    for x in 0..width {
        for y in 0..height {
            result[y * width + x] = columns[x * height + y];
        }
    }
    result
}
