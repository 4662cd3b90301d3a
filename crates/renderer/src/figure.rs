//! The chart canvas.
//!
//! A [`Figure`] is a projected plot area holding z-ordered map layers, plus
//! decorations (title, info box, colourbars, legend, inset, logo) placed by
//! figure fractions around it. Rendering rasterises everything once.

use chart_common::{ChartError, ChartResult, GriddedField, MapExtent};
use image::RgbaImage;
use projection::{adjust_map_ratio, MapProjection, PixelRect, Viewport};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Mask, Paint, PathBuilder,
    Pixmap, PixmapPaint, Rect, Stroke, StrokeDash, Transform,
};
use tracing::debug;

use crate::annotation::{draw_decoration, Decoration};
use crate::colormap::{ColorRule, Rgba};
use crate::contour::{project_contours, stroke_contours, ContourConfig, GeoContour};
use crate::resources::{City, Polyline};
use crate::text::{HAlign, TextRenderer, TextStyle, VAlign};

/// Plot area as figure fractions `[left, bottom, width, height]`.
pub const PLOT_AREA: [f64; 4] = [0.01, 0.1, 0.98, 0.84];

/// Output size and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: 16.0,
            height_in: 9.0,
            dpi: 200,
        }
    }
}

impl FigureConfig {
    pub fn width_px(&self) -> u32 {
        (self.width_in * self.dpi as f64).round() as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height_in * self.dpi as f64).round() as u32
    }

    /// Typographic points to pixels.
    pub fn pt(&self, points: f64) -> f32 {
        (points * self.dpi as f64 / 72.0) as f32
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.width_in <= 0.0 || self.height_in <= 0.0 || self.dpi == 0 {
            return Err(ChartError::InvalidConfig(format!(
                "figure must have a positive size and dpi, got {}x{} in at {} dpi",
                self.width_in, self.height_in, self.dpi
            )));
        }
        Ok(())
    }
}

/// Stroke style for boundary and grid lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: Rgba,
    /// Width in pixels
    pub width: f32,
    /// Dash pattern in pixels, solid when None
    pub dash: Option<Vec<f32>>,
}

impl LineStyle {
    pub fn solid(color: Rgba, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    /// Dashes scaled with the line width.
    pub fn dashed(color: Rgba, width: f32) -> Self {
        Self {
            color,
            width,
            dash: Some(vec![3.7 * width, 1.6 * width]),
        }
    }
}

/// What a map layer draws.
#[derive(Debug, Clone)]
pub enum LayerKind {
    /// Image stretched over the plot area
    Background(RgbaImage),
    /// Nearest-cell colouring of a single-step field
    RasterMesh { field: GriddedField, rule: ColorRule },
    /// Area where the bilinearly sampled field lies in `[lower, upper]`
    FilledBand {
        field: GriddedField,
        lower: f32,
        upper: f32,
        color: Rgba,
    },
    /// Labelled isolines
    LineContour {
        contours: Vec<GeoContour>,
        config: ContourConfig,
    },
    Polylines { lines: Vec<Polyline>, style: LineStyle },
    Polygons { rings: Vec<Polyline>, color: Rgba },
    /// Dot and name per place
    PlaceLabels { places: Vec<City>, style: TextStyle },
}

/// A layer drawn inside the plot area.
#[derive(Debug, Clone)]
pub struct MapLayer {
    pub name: String,
    pub zorder: i32,
    pub alpha: f32,
    pub kind: LayerKind,
}

impl MapLayer {
    pub fn new(name: impl Into<String>, zorder: i32, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            zorder,
            alpha: 1.0,
            kind,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }
}

/// A chart canvas, owned by one render call.
#[derive(Debug, Clone)]
pub struct Figure {
    pub config: FigureConfig,
    pub viewport: Viewport,
    /// Geographic extent actually shown after fitting the plot aspect ratio
    pub realised_extent: MapExtent,
    layers: Vec<MapLayer>,
    decorations: Vec<Decoration>,
}

impl Figure {
    /// Set up the projection for `extent` and fit it to the plot area.
    pub fn new(config: FigureConfig, extent: &MapExtent, global: bool) -> ChartResult<Self> {
        config.validate()?;
        let projection = MapProjection::for_extent(extent, global);
        let rect = PixelRect::from_fractions(
            PLOT_AREA,
            config.width_px() as f64,
            config.height_px() as f64,
        );
        let (viewport, realised_extent) = adjust_map_ratio(projection, extent, rect)?;
        Ok(Self {
            config,
            viewport,
            realised_extent,
            layers: Vec::new(),
            decorations: Vec::new(),
        })
    }

    /// Pixel rectangle of figure fractions `[left, bottom, width, height]`.
    pub fn fraction_rect(&self, fractions: [f64; 4]) -> PixelRect {
        PixelRect::from_fractions(
            fractions,
            self.config.width_px() as f64,
            self.config.height_px() as f64,
        )
    }

    pub fn add_layer(&mut self, layer: MapLayer) {
        self.layers.push(layer);
    }

    pub fn add_decoration(&mut self, decoration: Decoration) {
        self.decorations.push(decoration);
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    /// Rasterise the figure.
    pub fn render(&self, text: &TextRenderer) -> ChartResult<RgbaImage> {
        let (width, height) = (self.config.width_px(), self.config.height_px());
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ChartError::Render(format!("cannot allocate a {}x{} canvas", width, height))
        })?;
        pixmap.fill(Color::WHITE);

        let clip = rect_mask(width, height, &self.viewport.rect)?;

        // Stable sort keeps insertion order for equal z
        let mut ordered: Vec<&MapLayer> = self.layers.iter().collect();
        ordered.sort_by_key(|l| l.zorder);
        for layer in ordered {
            self.draw_layer(&mut pixmap, layer, text, &clip);
            debug!(layer = %layer.name, zorder = layer.zorder, "Drew layer");
        }

        draw_frame(&mut pixmap, &self.viewport.rect, self.config.pt(0.8));

        for decoration in &self.decorations {
            draw_decoration(&mut pixmap, self, decoration, text)?;
        }

        Ok(pixmap_to_image(&pixmap))
    }

    fn draw_layer(&self, pixmap: &mut Pixmap, layer: &MapLayer, text: &TextRenderer, clip: &Mask) {
        let viewport = &self.viewport;
        match &layer.kind {
            LayerKind::Background(image) => {
                draw_image_in_rect(pixmap, image, &viewport.rect, layer.alpha, Some(clip));
            }
            LayerKind::RasterMesh { field, rule } => {
                let raster = rasterize_plot_area(viewport, |lon, lat| {
                    field
                        .sample_nearest(0, lon, lat)
                        .and_then(|v| rule.color_for(v))
                });
                draw_raster(pixmap, raster, layer.alpha, clip);
            }
            LayerKind::FilledBand {
                field,
                lower,
                upper,
                color,
            } => {
                let raster = rasterize_plot_area(viewport, |lon, lat| {
                    field
                        .sample_bilinear(0, lon, lat)
                        .filter(|v| v >= lower && v <= upper)
                        .map(|_| *color)
                });
                draw_raster(pixmap, raster, layer.alpha, clip);
            }
            LayerKind::LineContour { contours, config } => {
                let projected = project_contours(contours, viewport);
                stroke_contours(pixmap, &projected, config, text, layer.alpha, Some(clip));
            }
            LayerKind::Polylines { lines, style } => {
                stroke_polylines(pixmap, viewport, lines, style, layer.alpha, Some(clip));
            }
            LayerKind::Polygons { rings, color } => {
                fill_polygons(pixmap, viewport, rings, *color, layer.alpha, Some(clip));
            }
            LayerKind::PlaceLabels { places, style } => {
                self.draw_places(pixmap, places, style, text, clip);
            }
        }
    }

    fn draw_places(
        &self,
        pixmap: &mut Pixmap,
        places: &[City],
        style: &TextStyle,
        text: &TextRenderer,
        clip: &Mask,
    ) {
        let radius = self.config.pt(2.5);
        let gap = self.config.pt(3.0);
        let label = style.align(HAlign::Left, VAlign::Middle);
        let paint = solid_paint(style.color, 1.0);

        for place in places {
            let Some((px, py)) = self.viewport.geo_to_pixel(place.lon, place.lat) else {
                continue;
            };
            if !self.viewport.rect.contains(px, py) {
                continue;
            }
            let (px, py) = (px as f32, py as f32);
            if let Some(dot) = PathBuilder::from_circle(px, py, radius) {
                pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), Some(clip));
            }
            text.draw(pixmap, &place.name, px + gap, py, &label, Some(clip));
        }
    }
}

/// Longest step, in degrees, between vertices handed to the projection
const MAX_SEGMENT_DEG: f64 = 1.0;

/// Upper bound on vertices inserted into one segment
const MAX_SEGMENT_SPLITS: f64 = 3600.0;

/// Insert vertices so no step spans more than [`MAX_SEGMENT_DEG`] in
/// longitude or latitude.
pub fn densify(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        let ((lon0, lat0), (lon1, lat1)) = (pair[0], pair[1]);
        let span = (lon1 - lon0).abs().max((lat1 - lat0).abs());
        let n = if span.is_finite() {
            (span / MAX_SEGMENT_DEG).ceil().clamp(1.0, MAX_SEGMENT_SPLITS) as usize
        } else {
            1
        };
        for k in 0..n {
            let t = k as f64 / n as f64;
            out.push((lon0 + t * (lon1 - lon0), lat0 + t * (lat1 - lat0)));
        }
    }
    if let Some(&last) = points.last() {
        out.push(last);
    }
    out
}

/// Longitude relative to `central`, in `[-180, 180)`.
fn seam_offset(lon: f64, central: f64) -> f64 {
    (lon - central + 180.0).rem_euclid(360.0) - 180.0
}

/// Project a lon/lat polyline to pixels, splitting it where points fall
/// outside the projection or the line crosses the meridian opposite the
/// projection centre.
pub fn project_path(viewport: &Viewport, points: &[(f64, f64)]) -> Vec<Vec<(f32, f32)>> {
    let central = viewport.projection.central_longitude();
    let mut parts = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    let mut last_offset: Option<f64> = None;

    let mut flush = |current: &mut Vec<(f32, f32)>| {
        if current.len() >= 2 {
            parts.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for (lon, lat) in densify(points) {
        let offset = seam_offset(lon, central);
        if last_offset.is_some_and(|prev| (offset - prev).abs() > 180.0) {
            flush(&mut current);
        }
        match viewport.geo_to_pixel(lon, lat) {
            Some((px, py)) if px.is_finite() && py.is_finite() => {
                current.push((px as f32, py as f32));
                last_offset = Some(offset);
            }
            _ => {
                flush(&mut current);
                last_offset = None;
            }
        }
    }
    flush(&mut current);
    parts
}

/// Project a closed lon/lat ring to pixels as one ring.
///
/// Longitudes are unwrapped around the projection centre and held just inside
/// the seam, so a ring crossing it follows the map edge instead of breaking.
pub fn project_ring(viewport: &Viewport, ring: &[(f64, f64)]) -> Vec<(f32, f32)> {
    let central = viewport.projection.central_longitude();
    let limit = 180.0 - 1e-6;
    let mut unwrapped: Option<f64> = None;
    let mut out = Vec::with_capacity(ring.len());

    for (lon, lat) in densify(ring) {
        if !lon.is_finite() {
            continue;
        }
        let offset = seam_offset(lon, central);
        let rel = match unwrapped {
            Some(prev) => prev + seam_offset(offset - prev, 0.0),
            None => offset,
        };
        unwrapped = Some(rel);
        if let Some((px, py)) = viewport.geo_to_pixel(central + rel.clamp(-limit, limit), lat) {
            if px.is_finite() && py.is_finite() {
                out.push((px as f32, py as f32));
            }
        }
    }
    out
}

pub(crate) fn solid_paint(color: Rgba, alpha: f32) -> Paint<'static> {
    let [r, g, b, a] = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, (a as f32 * alpha).round() as u8);
    paint.anti_alias = true;
    paint
}

/// Mask covering `rect`.
pub(crate) fn rect_mask(width: u32, height: u32, rect: &PixelRect) -> ChartResult<Mask> {
    let mut mask = Mask::new(width, height)
        .ok_or_else(|| ChartError::Render(format!("cannot allocate a {}x{} mask", width, height)))?;
    let bounds = to_skia_rect(rect)?;
    mask.fill_path(
        &PathBuilder::from_rect(bounds),
        FillRule::Winding,
        false,
        Transform::identity(),
    );
    Ok(mask)
}

pub(crate) fn to_skia_rect(rect: &PixelRect) -> ChartResult<Rect> {
    Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
    .ok_or_else(|| ChartError::Render(format!("degenerate rectangle {:?}", rect)))
}

fn draw_frame(pixmap: &mut Pixmap, rect: &PixelRect, width: f32) {
    let Ok(bounds) = to_skia_rect(rect) else {
        return;
    };
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &PathBuilder::from_rect(bounds),
        &solid_paint([0, 0, 0, 255], 1.0),
        &stroke,
        Transform::identity(),
        None,
    );
}

/// Colour every plot-area pixel by its geographic position.
fn rasterize_plot_area<F>(viewport: &Viewport, color_at: F) -> Option<(Pixmap, i32, i32)>
where
    F: Fn(f64, f64) -> Option<Rgba> + Sync,
{
    let rect = viewport.rect;
    let x0 = rect.x.floor() as i32;
    let y0 = rect.y.floor() as i32;
    let width = (rect.right().ceil() as i32 - x0).max(0) as u32;
    let height = (rect.bottom().ceil() as i32 - y0).max(0) as u32;
    let mut raster = Pixmap::new(width, height)?;

    let row_bytes = width as usize * 4;
    raster
        .data_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(row, out)| {
            let py = y0 as f64 + row as f64 + 0.5;
            for (col, pixel) in out.chunks_exact_mut(4).enumerate() {
                let px = x0 as f64 + col as f64 + 0.5;
                let Some((lon, lat)) = viewport.pixel_to_geo(px, py) else {
                    continue;
                };
                if let Some([r, g, b, a]) = color_at(lon, lat) {
                    let c = ColorU8::from_rgba(r, g, b, a).premultiply();
                    pixel.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                }
            }
        });

    Some((raster, x0, y0))
}

fn draw_raster(pixmap: &mut Pixmap, raster: Option<(Pixmap, i32, i32)>, alpha: f32, clip: &Mask) {
    let Some((raster, x, y)) = raster else {
        return;
    };
    let paint = PixmapPaint {
        opacity: alpha,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Nearest,
    };
    pixmap.draw_pixmap(x, y, raster.as_ref(), &paint, Transform::identity(), Some(clip));
}

/// Stretch `image` over `rect`.
pub(crate) fn draw_image_in_rect(
    pixmap: &mut Pixmap,
    image: &RgbaImage,
    rect: &PixelRect,
    alpha: f32,
    clip: Option<&Mask>,
) {
    let Some(source) = image_to_pixmap(image) else {
        return;
    };
    let sx = rect.width as f32 / source.width() as f32;
    let sy = rect.height as f32 / source.height() as f32;
    let paint = PixmapPaint {
        opacity: alpha,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    pixmap.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &paint,
        Transform::from_row(sx, 0.0, 0.0, sy, rect.x as f32, rect.y as f32),
        clip,
    );
}

pub(crate) fn stroke_polylines(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    lines: &[Polyline],
    style: &LineStyle,
    alpha: f32,
    clip: Option<&Mask>,
) {
    let mut pb = PathBuilder::new();
    for line in lines {
        for part in project_path(viewport, line) {
            pb.move_to(part[0].0, part[0].1);
            for &(x, y) in &part[1..] {
                pb.line_to(x, y);
            }
        }
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width: style.width,
        line_cap: LineCap::Butt,
        line_join: LineJoin::Round,
        dash: style
            .dash
            .as_ref()
            .and_then(|pattern| StrokeDash::new(pattern.clone(), 0.0)),
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &path,
        &solid_paint(style.color, alpha),
        &stroke,
        Transform::identity(),
        clip,
    );
}

pub(crate) fn fill_polygons(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    rings: &[Polyline],
    color: Rgba,
    alpha: f32,
    clip: Option<&Mask>,
) {
    let mut pb = PathBuilder::new();
    for ring in rings {
        let points = project_ring(viewport, ring);
        if points.len() < 3 {
            continue;
        }
        pb.move_to(points[0].0, points[0].1);
        for &(x, y) in &points[1..] {
            pb.line_to(x, y);
        }
        pb.close();
    }
    if let Some(path) = pb.finish() {
        pixmap.fill_path(
            &path,
            &solid_paint(color, alpha),
            FillRule::EvenOdd,
            Transform::identity(),
            clip,
        );
    }
}

/// Premultiplied canvas to a straight-alpha image.
pub(crate) fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}

pub(crate) fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::mask_light_precipitation;
    use test_utils::{extents, padded, precipitation_field};

    fn small_config() -> FigureConfig {
        FigureConfig {
            width_in: 4.0,
            height_in: 2.0,
            dpi: 50,
        }
    }

    fn extent() -> MapExtent {
        MapExtent::new(100.0, 130.0, 20.0, 45.0).unwrap()
    }

    fn covering_ring() -> Polyline {
        vec![(70.0, 5.0), (160.0, 5.0), (160.0, 65.0), (70.0, 65.0), (70.0, 5.0)]
    }

    fn center_pixel(figure: &Figure, image: &RgbaImage) -> [u8; 4] {
        let rect = figure.viewport.rect;
        let x = (rect.x + rect.width / 2.0) as u32;
        let y = (rect.y + rect.height / 2.0) as u32;
        image.get_pixel(x, y).0
    }

    #[test]
    fn test_figure_config_sizes() {
        let config = FigureConfig::default();
        assert_eq!((config.width_px(), config.height_px()), (3200, 1800));
        assert!((config.pt(72.0) - 200.0).abs() < 1e-4);
        assert!(FigureConfig { dpi: 0, ..config }.validate().is_err());
    }

    #[test]
    fn test_realised_extent_contains_request() {
        let figure = Figure::new(small_config(), &extent(), false).unwrap();
        assert!(figure.realised_extent.contains_extent(&extent()));
    }

    #[test]
    fn test_empty_figure_is_white() {
        let figure = Figure::new(small_config(), &extent(), false).unwrap();
        let image = figure.render(&TextRenderer::disabled()).unwrap();
        assert_eq!(image.dimensions(), (200, 100));
        assert_eq!(center_pixel(&figure, &image), [255, 255, 255, 255]);
    }

    #[test]
    fn test_layers_drawn_in_z_order() {
        let mut figure = Figure::new(small_config(), &extent(), false).unwrap();
        figure.add_layer(MapLayer::new(
            "red",
            5,
            LayerKind::Polygons {
                rings: vec![covering_ring()],
                color: [255, 0, 0, 255],
            },
        ));
        figure.add_layer(MapLayer::new(
            "blue",
            1,
            LayerKind::Polygons {
                rings: vec![covering_ring()],
                color: [0, 0, 255, 255],
            },
        ));
        let image = figure.render(&TextRenderer::disabled()).unwrap();
        assert_eq!(center_pixel(&figure, &image), [255, 0, 0, 255]);
    }

    #[test]
    fn test_equal_z_keeps_insertion_order() {
        let mut figure = Figure::new(small_config(), &extent(), false).unwrap();
        for (name, color) in [("first", [0, 255, 0, 255]), ("second", [0, 0, 255, 255])] {
            figure.add_layer(MapLayer::new(
                name,
                3,
                LayerKind::Polygons {
                    rings: vec![covering_ring()],
                    color,
                },
            ));
        }
        let image = figure.render(&TextRenderer::disabled()).unwrap();
        assert_eq!(center_pixel(&figure, &image), [0, 0, 255, 255]);
    }

    #[test]
    fn test_layers_clipped_to_plot_area() {
        let mut figure = Figure::new(small_config(), &extent(), false).unwrap();
        figure.add_layer(MapLayer::new(
            "fill",
            1,
            LayerKind::Polygons {
                rings: vec![covering_ring()],
                color: [255, 0, 0, 255],
            },
        ));
        let image = figure.render(&TextRenderer::disabled()).unwrap();
        // Bottom strip below the plot area stays white
        assert_eq!(image.get_pixel(100, 98).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_raster_mesh_blends_at_half_alpha() {
        let mut figure = Figure::new(small_config(), &extent(), false).unwrap();
        let mut field = precipitation_field(
            chart_common::FieldKind::Precipitation,
            &padded(&figure.realised_extent, 5.0),
            60,
            40,
        );
        field.data.iter_mut().for_each(|v| *v = 30.0);
        let rule = ColorRule::qpf_nws(24);
        let expected = rule.color_for(30.0).unwrap();
        figure.add_layer(
            MapLayer::new("rain", 1, LayerKind::RasterMesh { field, rule }).with_alpha(0.5),
        );

        let image = figure.render(&TextRenderer::disabled()).unwrap();
        let pixel = center_pixel(&figure, &image);
        for c in 0..3 {
            let blended = (expected[c] as f32 * 0.5 + 255.0 * 0.5) as i32;
            assert!((pixel[c] as i32 - blended).abs() <= 2, "{:?} vs {:?}", pixel, expected);
        }
    }

    #[test]
    fn test_masked_precipitation_is_transparent() {
        let mut figure = Figure::new(small_config(), &extent(), false).unwrap();
        let mut field = precipitation_field(
            chart_common::FieldKind::Precipitation,
            &padded(&figure.realised_extent, 5.0),
            60,
            40,
        );
        field.data.iter_mut().for_each(|v| *v = 0.1);
        mask_light_precipitation(&mut field.data);
        figure.add_layer(
            MapLayer::new(
                "rain",
                1,
                LayerKind::RasterMesh {
                    field,
                    rule: ColorRule::qpf_nws(24),
                },
            )
            .with_alpha(0.5),
        );
        let image = figure.render(&TextRenderer::disabled()).unwrap();
        assert_eq!(center_pixel(&figure, &image), [255, 255, 255, 255]);
    }

    #[test]
    fn test_filled_band_includes_its_bounds() {
        let mut figure = Figure::new(small_config(), &extent(), false).unwrap();
        let field = precipitation_field(
            chart_common::FieldKind::Precipitation,
            &padded(&figure.realised_extent, 5.0),
            60,
            40,
        );
        let rect = figure.viewport.rect;
        let (x, y) = ((rect.x + rect.width / 2.0) as u32, (rect.y + rect.height / 2.0) as u32);
        let (lon, lat) = figure
            .viewport
            .pixel_to_geo(x as f64 + 0.5, y as f64 + 0.5)
            .unwrap();
        let value = field.sample_bilinear(0, lon, lat).unwrap();
        figure.add_layer(MapLayer::new(
            "band",
            1,
            LayerKind::FilledBand {
                field,
                lower: value,
                upper: value,
                color: [0, 128, 0, 255],
            },
        ));

        let image = figure.render(&TextRenderer::disabled()).unwrap();
        assert_eq!(image.get_pixel(x, y).0, [0, 128, 0, 255]);
    }

    #[test]
    fn test_project_path_splits_at_seam() {
        let figure = Figure::new(small_config(), &extents::GLOBAL, true).unwrap();
        // Crosses the Robinson seam at 115 - 180 = -65
        let line = vec![(-70.0, 10.0), (-66.0, 10.0), (-64.0, 10.0), (-60.0, 10.0)];
        let parts = project_path(&figure.viewport, &line);
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_project_path_keeps_segment_longer_than_plot() {
        let extent = MapExtent::new(110.0, 122.0, 25.0, 33.0).unwrap();
        let figure = Figure::new(small_config(), &extent, false).unwrap();
        let parts = project_path(&figure.viewport, &[(105.0, 30.0), (127.0, 30.0)]);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 23);
    }

    #[test]
    fn test_densify_limits_step() {
        let points = densify(&[(100.0, 20.0), (103.0, 20.5), (103.0, 20.5)]);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (100.0, 20.0));
        assert_eq!(*points.last().unwrap(), (103.0, 20.5));
        assert!(points
            .windows(2)
            .all(|w| (w[1].0 - w[0].0).abs() <= MAX_SEGMENT_DEG + 1e-9));
    }

    #[test]
    fn test_ring_larger_than_extent_fills_plot() {
        let extent = MapExtent::new(110.0, 122.0, 25.0, 33.0).unwrap();
        let mut figure = Figure::new(small_config(), &extent, false).unwrap();
        let ring = vec![(100.0, 20.0), (130.0, 20.0), (130.0, 40.0), (100.0, 40.0), (100.0, 20.0)];
        assert_eq!(project_ring(&figure.viewport, &ring).len(), densify(&ring).len());
        figure.add_layer(MapLayer::new(
            "ocean",
            -1,
            LayerKind::Polygons {
                rings: vec![ring],
                color: [0, 0, 255, 255],
            },
        ));
        let image = figure.render(&TextRenderer::disabled()).unwrap();
        assert_eq!(center_pixel(&figure, &image), [0, 0, 255, 255]);
    }

    #[test]
    fn test_ring_across_seam_stays_whole() {
        let figure = Figure::new(small_config(), &extents::GLOBAL, true).unwrap();
        let ring = vec![(-80.0, 0.0), (-50.0, 0.0), (-50.0, 20.0), (-80.0, 20.0), (-80.0, 0.0)];
        let points = project_ring(&figure.viewport, &ring);
        assert_eq!(points.len(), densify(&ring).len());
        let (first, last) = (points[0], points[points.len() - 1]);
        assert!((first.0 - last.0).abs() < 1e-2 && (first.1 - last.1).abs() < 1e-2);
        // Held against the eastern edge rather than wrapping to the west
        let middle = (figure.viewport.rect.x + figure.viewport.rect.width / 2.0) as f32;
        assert!(points.iter().all(|p| p.0 > middle));
    }

    #[test]
    fn test_image_pixmap_roundtrip() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        image.put_pixel(1, 0, image::Rgba([0, 0, 0, 0]));
        let pixmap = image_to_pixmap(&image).unwrap();
        assert_eq!(pixmap_to_image(&pixmap), image);
    }
}
