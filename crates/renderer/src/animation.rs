//! Frame-by-frame animation of a multi-step precipitation field.

use chart_common::{ChartError, ChartResult, DateStyle, ForecastTime, GriddedField};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::annotation::{forecast_info_lines, info_box, ANIMATION_INFO_FILL};
use crate::colormap::{mask_light_precipitation, ColorRule};
use crate::figure::{Figure, LayerKind, MapLayer};

/// Frames in an animation.
pub const ANIMATION_FRAMES: usize = 4;

/// Time each frame is shown.
pub const FRAME_DELAY_MS: u32 = 1000;

/// Quantiser speed for GIF frames (1 best, 30 fastest).
const GIF_SPEED: i32 = 10;

/// What one animation frame shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    /// Time step of the field drawn in this frame
    pub index: usize,
    pub forecast: ForecastTime,
}

/// States of the first `frames` steps of `field`.
pub fn frame_states(field: &GriddedField, frames: usize) -> ChartResult<Vec<FrameState>> {
    if field.steps < frames {
        return Err(ChartError::InsufficientSteps {
            needed: frames,
            found: field.steps,
        });
    }
    (0..frames)
        .map(|index| {
            Ok(FrameState {
                index,
                forecast: field.forecast_time(index)?,
            })
        })
        .collect()
}

/// The base figure plus the frame's precipitation mesh and time annotation.
pub fn frame_figure(
    base: &Figure,
    field: &GriddedField,
    rule: &ColorRule,
    frame: &FrameState,
    zorder: i32,
    style: &DateStyle,
) -> ChartResult<Figure> {
    let mut slice = field.slice_step(frame.index)?;
    mask_light_precipitation(&mut slice.data);

    let mut figure = base.clone();
    figure.add_layer(
        MapLayer::new(
            field.name(),
            zorder,
            LayerKind::RasterMesh {
                field: slice,
                rule: rule.clone(),
            },
        )
        .with_alpha(0.5),
    );
    figure.add_decoration(info_box(
        forecast_info_lines(&frame.forecast, style),
        ANIMATION_INFO_FILL,
    ));
    Ok(figure)
}

/// Encode frames as an endlessly looping GIF.
pub fn encode_gif(frames: &[RgbaImage], delay_ms: u32) -> ChartResult<Vec<u8>> {
    let encode_err = |e: image::ImageError| ChartError::Encode(format!("GIF encoding failed: {}", e));

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_err)?;
        for image in frames {
            let frame = Frame::from_parts(
                image.clone(),
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            );
            encoder.encode_frame(frame).map_err(encode_err)?;
        }
    }
    Ok(bytes)
}
