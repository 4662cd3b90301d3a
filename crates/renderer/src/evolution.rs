//! Rain-extent evolution: one semi-transparent filled area per time step.
//!
//! Later steps are drawn more opaque and in later palette colours, so the
//! movement of the rain area reads from faint to strong.

use chart_common::{ChartError, ChartResult, DateStyle, GriddedField};
use tracing::debug;

use crate::colormap::{evolution_opacity, evolution_palette_color, mask_light_precipitation, Rgba};
use crate::figure::{LayerKind, MapLayer};

/// Upper bound of the filled band; no realistic accumulation exceeds it.
pub const EXTENT_UPPER_BOUND: f32 = 800.0;

/// One row of a legend: a colour patch and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgba,
    pub opacity: f64,
}

/// Composited steps of an evolution field.
#[derive(Debug, Clone)]
pub struct EvolutionComposite {
    /// One filled layer per step, in step order
    pub layers: Vec<MapLayer>,
    /// One legend entry per step, in step order
    pub legend: Vec<LegendEntry>,
}

/// Build the filled area of every step where the value reaches `threshold`.
///
/// Step `i` of `N` is coloured with `evolution_palette_color(i, N)`, drawn at
/// opacity `0.2 + i * (0.8 / N)` and labelled with its valid time.
pub fn composite_evolution(
    field: &GriddedField,
    threshold: f32,
    zorder: i32,
    style: &DateStyle,
) -> ChartResult<EvolutionComposite> {
    field.validate()?;
    let steps = field.steps;
    if steps == 0 || field.meta.forecast_periods.is_empty() {
        return Err(ChartError::EmptyTimeAxis(field.name().to_string()));
    }

    let mut layers = Vec::with_capacity(steps);
    let mut legend = Vec::with_capacity(steps);

    for index in 0..steps {
        let mut slice = field.slice_step(index)?;
        mask_light_precipitation(&mut slice.data);

        let color = evolution_palette_color(index, steps);
        let opacity = evolution_opacity(index, steps);
        let valid_time = field.forecast_time(index)?.valid_time();

        layers.push(
            MapLayer::new(
                format!("{}_extent_{}", field.name(), index),
                zorder,
                LayerKind::FilledBand {
                    field: slice,
                    lower: threshold,
                    upper: EXTENT_UPPER_BOUND,
                    color,
                },
            )
            .with_alpha(opacity as f32),
        );
        legend.push(LegendEntry {
            label: style.format_short(&valid_time),
            color,
            opacity,
        });
    }

    debug!(
        field = field.name(),
        steps,
        threshold,
        "Composited evolution steps"
    );

    Ok(EvolutionComposite { layers, legend })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{evolution_field, extents};

    #[test]
    fn test_one_layer_and_entry_per_step() {
        let field = evolution_field(&extents::JIANGNAN, 30, 26, 6, 6);
        let composite = composite_evolution(&field, 4.0, 3, &DateStyle::Chinese).unwrap();
        assert_eq!(composite.layers.len(), 6);
        assert_eq!(composite.legend.len(), 6);
        assert!(composite.layers.iter().all(|l| l.zorder == 3));
    }

    #[test]
    fn test_opacity_strictly_increases() {
        let field = evolution_field(&extents::JIANGNAN, 30, 26, 8, 3);
        let composite = composite_evolution(&field, 4.0, 3, &DateStyle::Chinese).unwrap();
        for (i, entry) in composite.legend.iter().enumerate() {
            assert_eq!(entry.opacity, 0.2 + i as f64 * (0.8 / 8.0));
        }
        assert!(composite
            .legend
            .windows(2)
            .all(|w| w[1].opacity > w[0].opacity));
    }

    #[test]
    fn test_legend_is_chronological_and_unique() {
        let field = evolution_field(&extents::JIANGNAN, 30, 26, 4, 6);
        let composite = composite_evolution(&field, 4.0, 3, &DateStyle::Chinese).unwrap();
        let labels: Vec<&str> = composite.legend.iter().map(|e| e.label.as_str()).collect();
        // Reference 2024-01-15 08:00, steps every 6 h
        assert_eq!(labels, vec!["01月15日14时", "01月15日20时", "01月16日02时", "01月16日08时"]);
    }

    #[test]
    fn test_band_covers_threshold_to_upper_bound() {
        let field = evolution_field(&extents::JIANGNAN, 30, 26, 2, 6);
        let composite = composite_evolution(&field, 10.0, 3, &DateStyle::Chinese).unwrap();
        match &composite.layers[1].kind {
            LayerKind::FilledBand {
                field,
                lower,
                upper,
                color,
            } => {
                assert_eq!(field.steps, 1);
                assert_eq!(*lower, 10.0);
                assert_eq!(*upper, EXTENT_UPPER_BOUND);
                assert_eq!(*color, evolution_palette_color(1, 2));
                assert!(field.data.iter().all(|v| v.is_nan() || *v > 0.1));
            }
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_empty_time_axis_is_error() {
        let mut field = evolution_field(&extents::JIANGNAN, 30, 26, 2, 6);
        field.steps = 0;
        field.data.clear();
        field.meta.forecast_periods.clear();
        let err = composite_evolution(&field, 4.0, 3, &DateStyle::Chinese).unwrap_err();
        assert!(matches!(err, ChartError::EmptyTimeAxis(_)));
    }

    #[test]
    fn test_mismatched_axes_is_error() {
        let mut field = evolution_field(&extents::JIANGNAN, 30, 26, 2, 6);
        field.data.pop();
        let err = composite_evolution(&field, 4.0, 3, &DateStyle::Chinese).unwrap_err();
        assert!(matches!(err, ChartError::ShapeMismatch(_)));
    }
}
