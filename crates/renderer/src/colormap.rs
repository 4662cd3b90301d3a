//! Discrete colour rules for precipitation-type fields and the palette used
//! by the evolution charts.
//!
//! A [`ColorRule`] maps a value to the colour of the bin it falls in:
//! values below the first boundary are transparent, values at or above the
//! last boundary take the last colour.

use chart_common::{ChartError, ChartResult};

/// RGBA colour, straight (not premultiplied) alpha.
pub type Rgba = [u8; 4];

/// Precipitation amounts at or below this are drawn as no data (mm).
pub const PRECIP_MASK_THRESHOLD: f32 = 0.1;

/// Accumulation periods with dedicated tables (hours).
pub const SUPPORTED_PERIODS: [u32; 5] = [1, 3, 6, 12, 24];

/// Ordered value boundaries with one colour per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRule {
    pub name: String,
    /// Ascending; `colors.len() + 1` entries
    pub boundaries: Vec<f32>,
    pub colors: Vec<Rgba>,
}

impl ColorRule {
    pub fn new(name: impl Into<String>, boundaries: Vec<f32>, colors: Vec<Rgba>) -> ChartResult<Self> {
        let name = name.into();
        if colors.is_empty() || boundaries.len() != colors.len() + 1 {
            return Err(ChartError::InvalidConfig(format!(
                "colour rule {}: {} boundaries for {} colours",
                name,
                boundaries.len(),
                colors.len()
            )));
        }
        if !boundaries.windows(2).all(|w| w[1] > w[0]) {
            return Err(ChartError::InvalidConfig(format!(
                "colour rule {}: boundaries must be strictly ascending",
                name
            )));
        }
        Ok(Self {
            name,
            boundaries,
            colors,
        })
    }

    /// Colour for a value; None (transparent) for NaN and under-range values.
    pub fn color_for(&self, value: f32) -> Option<Rgba> {
        if value.is_nan() || value < self.boundaries[0] {
            return None;
        }
        // First boundary strictly above the value closes its bin
        let upper = self.boundaries.partition_point(|&b| b <= value);
        let bin = upper.saturating_sub(1).min(self.colors.len() - 1);
        Some(self.colors[bin])
    }

    /// Bins as `(lower, upper, colour)`.
    pub fn bins(&self) -> impl Iterator<Item = (f32, f32, Rgba)> + '_ {
        self.boundaries
            .windows(2)
            .zip(&self.colors)
            .map(|(w, &c)| (w[0], w[1], c))
    }

    /// NWS-style QPF table, used for total precipitation.
    pub fn qpf_nws(hours: u32) -> Self {
        let period = supported_period(hours);
        Self::from_table(format!("qpf_nws_{period}h"), qpf_boundaries(period), &QPF_COLORS)
    }

    /// Rain table of the rain/snow/sleet chart.
    pub fn rain_nws(hours: u32) -> Self {
        let period = supported_period(hours);
        Self::from_table(format!("rain_nws_{period}h"), rain_boundaries(period), &RAIN_COLORS)
    }

    /// Snow table of the rain/snow/sleet chart.
    pub fn snow_nws(hours: u32) -> Self {
        let period = supported_period(hours);
        Self::from_table(format!("snow_nws_{period}h"), solid_boundaries(period), &SNOW_COLORS)
    }

    /// Sleet table of the rain/snow/sleet chart.
    pub fn sleet_nws(hours: u32) -> Self {
        let period = supported_period(hours);
        Self::from_table(format!("sleet_nws_{period}h"), solid_boundaries(period), &SLEET_COLORS)
    }

    fn from_table(name: String, boundaries: &[f32], colors: &[Rgba]) -> Self {
        Self {
            name,
            boundaries: boundaries.to_vec(),
            colors: colors.to_vec(),
        }
    }
}

/// The table period used for an accumulation period: the nearest supported
/// period not shorter than it, 24 h for anything longer.
pub fn supported_period(hours: u32) -> u32 {
    SUPPORTED_PERIODS
        .iter()
        .copied()
        .find(|&p| p >= hours)
        .unwrap_or(24)
}

/// Replace values at or below [`PRECIP_MASK_THRESHOLD`] with NaN.
pub fn mask_light_precipitation(values: &mut [f32]) {
    for v in values.iter_mut() {
        if *v <= PRECIP_MASK_THRESHOLD {
            *v = f32::NAN;
        }
    }
}

// ============================================================================
// Tables
// ============================================================================

const QPF_COLORS: [Rgba; 15] = [
    [4, 233, 231, 255],
    [1, 159, 244, 255],
    [3, 0, 244, 255],
    [2, 253, 2, 255],
    [1, 197, 1, 255],
    [0, 142, 0, 255],
    [253, 248, 2, 255],
    [229, 188, 0, 255],
    [253, 149, 0, 255],
    [253, 0, 0, 255],
    [212, 0, 0, 255],
    [188, 0, 0, 255],
    [248, 0, 253, 255],
    [152, 84, 198, 255],
    [253, 253, 253, 255],
];

fn qpf_boundaries(period: u32) -> &'static [f32] {
    match period {
        1 => &[0.1, 0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 15.0, 20.0, 30.0, 40.0, 50.0, 80.0],
        3 => &[0.1, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 13.0, 16.0, 20.0, 25.0, 30.0, 40.0, 50.0, 70.0, 100.0],
        6 => &[0.1, 1.0, 2.5, 5.0, 7.5, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0, 70.0, 90.0, 110.0, 150.0],
        12 => &[0.1, 1.0, 2.5, 5.0, 10.0, 15.0, 20.0, 25.0, 35.0, 50.0, 60.0, 70.0, 90.0, 110.0, 140.0, 200.0],
        _ => &[0.1, 1.0, 2.5, 5.0, 10.0, 15.0, 25.0, 35.0, 50.0, 75.0, 100.0, 125.0, 150.0, 200.0, 250.0, 400.0],
    }
}

const RAIN_COLORS: [Rgba; 6] = [
    [166, 242, 143, 255],
    [61, 186, 61, 255],
    [97, 184, 255, 255],
    [0, 0, 255, 255],
    [250, 0, 250, 255],
    [128, 0, 64, 255],
];

fn rain_boundaries(period: u32) -> &'static [f32] {
    match period {
        1 => &[0.1, 2.5, 8.0, 16.0, 20.0, 50.0, 800.0],
        3 => &[0.1, 3.0, 10.0, 20.0, 50.0, 70.0, 800.0],
        6 => &[0.1, 4.0, 13.0, 25.0, 60.0, 120.0, 800.0],
        12 => &[0.1, 5.0, 15.0, 30.0, 70.0, 140.0, 800.0],
        _ => &[0.1, 10.0, 25.0, 50.0, 100.0, 250.0, 800.0],
    }
}

const SNOW_COLORS: [Rgba; 6] = [
    [232, 232, 255, 255],
    [191, 191, 255, 255],
    [153, 153, 255, 255],
    [115, 115, 230, 255],
    [77, 77, 204, 255],
    [38, 38, 166, 255],
];

const SLEET_COLORS: [Rgba; 6] = [
    [255, 224, 236, 255],
    [255, 179, 207, 255],
    [255, 133, 179, 255],
    [255, 87, 150, 255],
    [230, 46, 122, 255],
    [179, 0, 92, 255],
];

/// Snow and sleet share thresholds (water equivalent, mm).
fn solid_boundaries(period: u32) -> &'static [f32] {
    match period {
        1 => &[0.1, 0.3, 0.8, 1.5, 3.0, 5.0, 800.0],
        3 => &[0.1, 0.5, 1.5, 3.0, 6.0, 10.0, 800.0],
        6 => &[0.1, 1.0, 2.5, 5.0, 10.0, 15.0, 800.0],
        12 => &[0.1, 1.5, 3.5, 7.0, 14.0, 21.0, 800.0],
        _ => &[0.1, 2.5, 5.0, 10.0, 20.0, 30.0, 800.0],
    }
}

// ============================================================================
// Evolution palette
// ============================================================================

/// Discrete palette the evolution steps are coloured from, early to late.
pub const EVOLUTION_PALETTE: [Rgba; 12] = [
    [0, 0, 200, 255],
    [0, 60, 255, 255],
    [0, 130, 255, 255],
    [0, 200, 230, 255],
    [0, 210, 140, 255],
    [40, 200, 40, 255],
    [150, 220, 0, 255],
    [240, 230, 0, 255],
    [255, 170, 0, 255],
    [255, 100, 0, 255],
    [230, 20, 0, 255],
    [160, 0, 40, 255],
];

/// Colour of step `index` of `steps`: palette entry `floor(index * P / steps)`.
pub fn evolution_palette_color(index: usize, steps: usize) -> Rgba {
    if steps == 0 {
        return EVOLUTION_PALETTE[0];
    }
    let slot = index * EVOLUTION_PALETTE.len() / steps;
    EVOLUTION_PALETTE[slot.min(EVOLUTION_PALETTE.len() - 1)]
}

/// Opacity of step `index` of `steps`: `0.2 + index * (0.8 / steps)`.
pub fn evolution_opacity(index: usize, steps: usize) -> f64 {
    0.2 + index as f64 * (0.8 / steps as f64)
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn hex_to_rgba(hex: &str) -> Option<Rgba> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tables() -> Vec<ColorRule> {
        SUPPORTED_PERIODS
            .iter()
            .flat_map(|&h| {
                [
                    ColorRule::qpf_nws(h),
                    ColorRule::rain_nws(h),
                    ColorRule::snow_nws(h),
                    ColorRule::sleet_nws(h),
                ]
            })
            .collect()
    }

    #[test]
    fn test_tables_are_well_formed() {
        for rule in all_tables() {
            assert_eq!(rule.boundaries.len(), rule.colors.len() + 1, "{}", rule.name);
            assert!(
                rule.boundaries.windows(2).all(|w| w[1] > w[0]),
                "{} boundaries not ascending",
                rule.name
            );
            assert!(ColorRule::new(rule.name.clone(), rule.boundaries.clone(), rule.colors.clone()).is_ok());
        }
    }

    #[test]
    fn test_under_range_is_transparent() {
        let rule = ColorRule::qpf_nws(24);
        assert_eq!(rule.color_for(0.05), None);
        assert_eq!(rule.color_for(f32::NAN), None);
        assert_eq!(rule.color_for(0.1), Some(rule.colors[0]));
    }

    #[test]
    fn test_over_range_clamps_to_last_color() {
        for rule in all_tables() {
            let last = *rule.colors.last().unwrap();
            let top = *rule.boundaries.last().unwrap();
            assert_eq!(rule.color_for(top), Some(last), "{}", rule.name);
            assert_eq!(rule.color_for(top * 10.0), Some(last), "{}", rule.name);
        }
    }

    #[test]
    fn test_bin_lookup() {
        let rule = ColorRule::rain_nws(24);
        assert_eq!(rule.color_for(9.99), Some(RAIN_COLORS[0]));
        assert_eq!(rule.color_for(10.0), Some(RAIN_COLORS[1]));
        assert_eq!(rule.color_for(60.0), Some(RAIN_COLORS[3]));
    }

    #[test]
    fn test_supported_period_rounds_up() {
        assert_eq!(supported_period(1), 1);
        assert_eq!(supported_period(2), 3);
        assert_eq!(supported_period(6), 6);
        assert_eq!(supported_period(9), 12);
        assert_eq!(supported_period(48), 24);
        assert_eq!(ColorRule::snow_nws(2).name, "snow_nws_3h");
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        assert!(ColorRule::new("bad", vec![0.0, 1.0], vec![[0; 4], [1; 4]]).is_err());
        assert!(ColorRule::new("bad", vec![1.0, 0.0], vec![[0; 4]]).is_err());
    }

    #[test]
    fn test_mask_light_precipitation() {
        let mut values = vec![0.0, 0.1, 0.11, 5.0, -1.0];
        mask_light_precipitation(&mut values);
        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
        assert_eq!(values[2], 0.11);
        assert_eq!(values[3], 5.0);
        assert!(values[4].is_nan());
    }

    #[test]
    fn test_evolution_opacity_formula() {
        let n = 7;
        let mut previous = f64::NEG_INFINITY;
        for i in 0..n {
            let alpha = evolution_opacity(i, n);
            assert_eq!(alpha, 0.2 + i as f64 * (0.8 / n as f64));
            assert!(alpha > previous);
            previous = alpha;
        }
        assert!(previous < 1.0);
    }

    #[test]
    fn test_evolution_palette_slicing() {
        assert_eq!(evolution_palette_color(0, 4), EVOLUTION_PALETTE[0]);
        assert_eq!(evolution_palette_color(1, 4), EVOLUTION_PALETTE[3]);
        assert_eq!(evolution_palette_color(3, 4), EVOLUTION_PALETTE[9]);
        assert_eq!(evolution_palette_color(20, 24), EVOLUTION_PALETTE[10]);
    }

    #[test]
    fn test_hex_to_rgba() {
        assert_eq!(hex_to_rgba("#74b9ff"), Some([0x74, 0xb9, 0xff, 255]));
        assert_eq!(hex_to_rgba("#FFFFFFCC"), Some([255, 255, 255, 0xcc]));
        assert_eq!(hex_to_rgba("#12345"), None);
        assert_eq!(hex_to_rgba("zzzzzz"), None);
    }
}
