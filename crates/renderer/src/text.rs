//! TrueType text drawn onto the chart canvas.
//!
//! Glyphs are rasterised with imageproc into a coverage sprite, then tinted
//! and composited onto the tiny-skia canvas so text respects the plot clip.

use std::path::Path;

use chart_common::{ChartError, ChartResult};
use image::{Rgba as ImageRgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tiny_skia::{FilterQuality, Mask, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};
use tracing::warn;

use crate::colormap::Rgba;

/// Horizontal anchor of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical anchor of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// How a run of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels
    pub size: f32,
    pub color: Rgba,
    pub h_align: HAlign,
    pub v_align: VAlign,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgba) -> Self {
        Self {
            size,
            color,
            h_align: HAlign::Left,
            v_align: VAlign::Top,
        }
    }

    pub fn align(mut self, h_align: HAlign, v_align: VAlign) -> Self {
        self.h_align = h_align;
        self.v_align = v_align;
        self
    }
}

/// Draws text with a loaded TrueType font.
///
/// A renderer without a font draws nothing; charts still render, just
/// without titles and labels.
#[derive(Clone, Default)]
pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("enabled", &self.font.is_some())
            .finish()
    }
}

impl TextRenderer {
    /// Load a TrueType/OpenType font file.
    pub fn from_file(path: impl AsRef<Path>) -> ChartResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ChartError::Font(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
            .map_err(|_| ChartError::Font(format!("{} is not a usable font", path.display())))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> ChartResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| ChartError::Font("invalid font data".to_string()))?;
        Ok(Self { font: Some(font) })
    }

    /// Load the font at `path` if one is configured and readable, otherwise
    /// fall back to a renderer that skips text.
    pub fn from_optional_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::from_file(path) {
                Ok(renderer) => renderer,
                Err(e) => {
                    warn!(error = %e, "Font unavailable, text will be skipped");
                    Self::disabled()
                }
            },
            None => {
                warn!("No font configured, text will be skipped");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height in pixels of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        match &self.font {
            Some(font) if !text.is_empty() => {
                let (w, h) = text_size(Scale::uniform(size), font, text);
                (w.max(0) as f32, h.max(0) as f32)
            }
            _ => (0.0, 0.0),
        }
    }

    /// Draw `text` anchored at (x, y).
    pub fn draw(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        y: f32,
        style: &TextStyle,
        clip: Option<&Mask>,
    ) {
        let Some(sprite) = self.render_sprite(text, style) else {
            return;
        };

        let (w, h) = (sprite.width() as f32, sprite.height() as f32);
        let left = match style.h_align {
            HAlign::Left => x,
            HAlign::Center => x - w / 2.0,
            HAlign::Right => x - w,
        };
        let top = match style.v_align {
            VAlign::Top => y,
            VAlign::Middle => y - h / 2.0,
            VAlign::Bottom => y - h,
        };

        pixmap.draw_pixmap(
            left.round() as i32,
            top.round() as i32,
            sprite.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            clip,
        );
    }

    /// Draw `text` centred on (cx, cy), rotated by `angle` radians.
    pub fn draw_rotated(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        cx: f32,
        cy: f32,
        angle: f32,
        style: &TextStyle,
        clip: Option<&Mask>,
    ) {
        let Some(sprite) = self.render_sprite(text, style) else {
            return;
        };
        let transform = Transform::from_translate(
            -(sprite.width() as f32) / 2.0,
            -(sprite.height() as f32) / 2.0,
        )
        .post_rotate(angle.to_degrees())
        .post_translate(cx, cy);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, sprite.as_ref(), &paint, transform, clip);
    }

    /// Rasterise `text` into a tinted, premultiplied sprite.
    fn render_sprite(&self, text: &str, style: &TextStyle) -> Option<Pixmap> {
        let font = self.font.as_ref()?;
        if text.trim().is_empty() || style.size <= 0.0 {
            return None;
        }
        let scale = Scale::uniform(style.size);
        let (w, h) = text_size(scale, font, text);
        // Glyph bounds can overhang the advance width slightly
        let pad = (style.size / 4.0).ceil() as u32;
        let width = w.max(1) as u32 + 2 * pad;
        let height = h.max(1) as u32 + 2 * pad;

        let mut coverage = RgbaImage::new(width, height);
        draw_text_mut(
            &mut coverage,
            ImageRgba([255, 255, 255, 255]),
            pad as i32,
            pad as i32,
            scale,
            font,
            text,
        );

        let mut sprite = Pixmap::new(width, height)?;
        let [r, g, b, a] = style.color;
        for (dst, src) in sprite.pixels_mut().iter_mut().zip(coverage.pixels()) {
            let alpha = (src.0[3] as u32 * a as u32 / 255) as u8;
            if alpha == 0 {
                continue;
            }
            let premultiply = |c: u8| (c as u32 * alpha as u32 / 255) as u8;
            if let Some(color) =
                PremultipliedColorU8::from_rgba(premultiply(r), premultiply(g), premultiply(b), alpha)
            {
                *dst = color;
            }
        }
        Some(sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_renderer_draws_nothing() {
        let text = TextRenderer::disabled();
        let mut pixmap = Pixmap::new(50, 20).unwrap();
        text.draw(
            &mut pixmap,
            "1012",
            0.0,
            0.0,
            &TextStyle::new(12.0, [0, 0, 0, 255]),
            None,
        );
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
        assert_eq!(text.measure("1012", 12.0), (0.0, 0.0));
    }

    #[test]
    fn test_invalid_font_bytes() {
        let err = TextRenderer::from_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, ChartError::Font(_)));
    }

    #[test]
    fn test_missing_font_file_falls_back() {
        let text = TextRenderer::from_optional_path(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!text.is_enabled());
    }

    #[test]
    fn test_text_draws_when_font_available() {
        let font_path = test_utils::require_font!();
        let text = TextRenderer::from_file(&font_path).unwrap();
        let mut pixmap = Pixmap::new(200, 60).unwrap();
        let style = TextStyle::new(24.0, [0, 0, 0, 255]).align(HAlign::Center, VAlign::Middle);
        text.draw(&mut pixmap, "588", 100.0, 30.0, &style, None);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 128));

        let (w, h) = text.measure("588", 24.0);
        assert!(w > 0.0 && h > 0.0);
    }

    #[test]
    fn test_rotated_text_centred_on_anchor() {
        let font_path = test_utils::require_font!();
        let text = TextRenderer::from_file(&font_path).unwrap();
        let mut pixmap = Pixmap::new(120, 120).unwrap();
        let style = TextStyle::new(24.0, [0, 0, 0, 255]);
        text.draw_rotated(&mut pixmap, "1012", 60.0, 60.0, std::f32::consts::FRAC_PI_2, &style, None);

        // Vertical run: ink spans rows more than columns
        let inked: Vec<(usize, usize)> = pixmap
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alpha() > 128)
            .map(|(i, _)| (i % 120, i / 120))
            .collect();
        assert!(!inked.is_empty());
        let span = |values: Vec<usize>| values.iter().max().unwrap() - values.iter().min().unwrap();
        let cols = span(inked.iter().map(|p| p.0).collect());
        let rows = span(inked.iter().map(|p| p.1).collect());
        assert!(rows > cols);
    }
}
