//! Map furniture and chart decorations.
//!
//! Builders here produce the basemap layers (ocean, boundaries, grid,
//! cities, background) and the decorations drawn outside the map layers:
//! title, forecast info box, colourbars, legend, South China Sea inset, logo.

use chart_common::{ChartResult, DateStyle, ForecastTime, MapExtent};
use image::RgbaImage;
use projection::{adjust_map_ratio, MapProjection, PixelRect};
use tiny_skia::{Pixmap, Stroke, Transform};

use crate::colormap::{hex_to_rgba, ColorRule, Rgba};
use crate::evolution::LegendEntry;
use crate::figure::{
    draw_image_in_rect, fill_polygons, rect_mask, solid_paint, stroke_polylines, to_skia_rect, Figure,
    FigureConfig, LayerKind, LineStyle, MapLayer, PLOT_AREA,
};
use crate::resources::{select_cities, Basemap, BoundaryLayer, City, Polyline};
use crate::text::{HAlign, TextRenderer, TextStyle, VAlign};

pub const OCEAN_COLOR: Rgba = [152, 183, 226, 255];
const GRAY: Rgba = [128, 128, 128, 255];
const BLACK: Rgba = [0, 0, 0, 255];
const WHITE: Rgba = [255, 255, 255, 255];

/// Info box fill of static charts (`#FFFFFFCC`).
pub const INFO_FILL: Rgba = [255, 255, 255, 204];
/// Info box fill of animations.
pub const ANIMATION_INFO_FILL: Rgba = WHITE;

pub const WEBSITE: &str = "www.nmc.cn";

/// Spacing of the lat/lon grid (degrees).
pub const GRID_SPACING: f64 = 15.0;

/// Below everything else on the map.
pub const BACKGROUND_ZORDER: i32 = -2;
pub const OCEAN_ZORDER: i32 = -1;

/// Realised longitude span under which every city is labelled.
pub const SMALL_CITY_SPAN: f64 = 25.0;

const TITLE_PT: f64 = 30.0;
const INFO_PT: f64 = 15.0;
const COLORBAR_LABEL_PT: f64 = 20.0;
const COLORBAR_TICK_PT: f64 = 14.4;
const LEGEND_PT: f64 = 10.0;
const CITY_PT: f64 = 13.0;

/// Extent shown by the South China Sea inset.
pub const SOUTH_CHINA_SEA: MapExtent = MapExtent {
    min_lon: 105.0,
    max_lon: 125.0,
    min_lat: 0.0,
    max_lat: 25.0,
};

// ============================================================================
// Placement (figure fractions, origin bottom-left)
// ============================================================================

pub fn info_box_fractions() -> [f64; 4] {
    let [l, b, _, h] = PLOT_AREA;
    [l, b + h - 0.1, 0.25, 0.1]
}

/// Colourbar below the plot area, `offset` from its left edge.
pub fn colorbar_fractions(offset: f64, width: f64) -> [f64; 4] {
    let [l, b, _, _] = PLOT_AREA;
    [l + offset, b - 0.04, width, 0.02]
}

/// Colourbar spanning the plot width.
pub fn full_colorbar_fractions() -> [f64; 4] {
    colorbar_fractions(0.0, PLOT_AREA[2])
}

pub fn inset_fractions() -> [f64; 4] {
    let [l, b, w, _] = PLOT_AREA;
    [l + w - 0.091, b, 0.1, 0.2]
}

pub fn logo_fractions() -> [f64; 4] {
    let [l, b, _, h] = PLOT_AREA;
    [l - 0.02, b + h - 0.1, 0.1, 0.1]
}

// ============================================================================
// Map layers
// ============================================================================

pub fn ocean_layer(basemap: &Basemap) -> Option<MapLayer> {
    if basemap.ocean.is_empty() {
        return None;
    }
    Some(MapLayer::new(
        "ocean",
        OCEAN_ZORDER,
        LayerKind::Polygons {
            rings: basemap.ocean.clone(),
            color: OCEAN_COLOR,
        },
    ))
}

/// Coastline, and with `add_china` the province, nation and river lines.
pub fn boundary_layers(
    basemap: &Basemap,
    add_china: bool,
    zorder: i32,
    config: &FigureConfig,
) -> Vec<MapLayer> {
    let river = hex_to_rgba("#74b9ff").unwrap_or(GRAY);
    let mut specs = vec![(BoundaryLayer::Coastline, GRAY, 0.8, 0.5)];
    if add_china {
        specs.push((BoundaryLayer::Province, GRAY, 0.5, 1.0));
        specs.push((BoundaryLayer::Nation, BLACK, 0.8, 1.0));
        specs.push((BoundaryLayer::River, river, 0.8, 0.5));
    }

    specs
        .into_iter()
        .filter(|(layer, ..)| !basemap.lines(*layer).is_empty())
        .map(|(layer, color, width_pt, alpha)| {
            MapLayer::new(
                layer.name(),
                zorder,
                LayerKind::Polylines {
                    lines: basemap.lines(layer).to_vec(),
                    style: LineStyle::solid(color, config.pt(width_pt)),
                },
            )
            .with_alpha(alpha)
        })
        .collect()
}

/// Dashed meridians at 0, 15, ..., 345 and parallels at -90, -75, ..., 75.
pub fn gridline_layer(zorder: i32, config: &FigureConfig) -> MapLayer {
    let mut lines: Vec<Polyline> = Vec::new();

    let mut lon = 0.0;
    while lon < 360.0 {
        lines.push((0..=180).map(|k| (lon, -90.0 + k as f64)).collect());
        lon += GRID_SPACING;
    }

    let mut lat = -90.0;
    while lat < 90.0 {
        lines.push((0..=360).map(|k| (k as f64, lat)).collect());
        lat += GRID_SPACING;
    }

    MapLayer::new(
        "grid",
        zorder,
        LayerKind::Polylines {
            lines,
            style: LineStyle::dashed(GRAY, config.pt(2.0)),
        },
    )
    .with_alpha(0.5)
}

pub fn background_layer(image: &RgbaImage) -> MapLayer {
    MapLayer::new("background", BACKGROUND_ZORDER, LayerKind::Background(image.clone()))
}

/// Whether every city rank is labelled for this realised extent.
pub fn is_small_city(realised: &MapExtent) -> bool {
    realised.lon_span() < SMALL_CITY_SPAN
}

pub fn city_layer(
    cities: &[City],
    realised: &MapExtent,
    zorder: i32,
    config: &FigureConfig,
) -> Option<MapLayer> {
    let places = select_cities(cities, realised, is_small_city(realised));
    if places.is_empty() {
        return None;
    }
    Some(MapLayer::new(
        "city",
        zorder,
        LayerKind::PlaceLabels {
            places,
            style: TextStyle::new(config.pt(CITY_PT), BLACK),
        },
    ))
}

// ============================================================================
// Decorations
// ============================================================================

/// South China Sea inset map.
#[derive(Debug, Clone)]
pub struct Inset {
    pub fractions: [f64; 4],
    pub extent: MapExtent,
    pub ocean: Vec<Polyline>,
    pub lines: Vec<(Vec<Polyline>, LineStyle)>,
}

/// Drawn on top of the map, in insertion order.
#[derive(Debug, Clone)]
pub enum Decoration {
    /// Left-aligned above the plot area
    Title { text: String },
    InfoBox {
        lines: Vec<String>,
        fill: Rgba,
        fractions: [f64; 4],
    },
    Colorbar {
        rule: ColorRule,
        label: String,
        alpha: f32,
        fractions: [f64; 4],
    },
    /// Lower-left corner of the plot area
    Legend { entries: Vec<LegendEntry> },
    Inset(Box<Inset>),
    Logo { image: RgbaImage, fractions: [f64; 4] },
}

pub fn title(text: impl Into<String>) -> Decoration {
    Decoration::Title { text: text.into() }
}

pub fn info_box(lines: Vec<String>, fill: Rgba) -> Decoration {
    Decoration::InfoBox {
        lines,
        fill,
        fractions: info_box_fractions(),
    }
}

pub fn colorbar(rule: ColorRule, label: impl Into<String>, fractions: [f64; 4]) -> Decoration {
    Decoration::Colorbar {
        rule,
        label: label.into(),
        alpha: 0.5,
        fractions,
    }
}

pub fn legend(entries: Vec<LegendEntry>) -> Decoration {
    Decoration::Legend { entries }
}

pub fn south_china_sea_inset(basemap: &Basemap, config: &FigureConfig) -> Decoration {
    let mut lines = vec![(
        basemap.coastline.clone(),
        LineStyle::solid(GRAY, config.pt(0.5)),
    )];
    lines.push((basemap.nation.clone(), LineStyle::solid(BLACK, config.pt(0.5))));
    Decoration::Inset(Box::new(Inset {
        fractions: inset_fractions(),
        extent: SOUTH_CHINA_SEA,
        ocean: basemap.ocean.clone(),
        lines,
    }))
}

pub fn logo(image: &RgbaImage) -> Decoration {
    Decoration::Logo {
        image: image.clone(),
        fractions: logo_fractions(),
    }
}

/// Info lines of a single forecast: reference time, valid time, lead.
pub fn forecast_info_lines(forecast: &ForecastTime, style: &DateStyle) -> Vec<String> {
    vec![
        format!("起报时间: {}", style.format_full(&forecast.reference_time)),
        format!("预报时间: {}", style.format_full(&forecast.valid_time())),
        format!("预报时效: {}小时", forecast.lead_whole_hours()),
        WEBSITE.to_string(),
    ]
}

/// Info lines of an evolution: reference time, first and last valid time.
pub fn evolution_info_lines(first: &ForecastTime, last: &ForecastTime, style: &DateStyle) -> Vec<String> {
    vec![
        format!("起报时间: {}", style.format_full(&first.reference_time)),
        format!("起始时间: {}", style.format_full(&first.valid_time())),
        format!("终止时间: {}", style.format_full(&last.valid_time())),
        WEBSITE.to_string(),
    ]
}

// ============================================================================
// Drawing
// ============================================================================

/// Baselines of the info box lines, in tenths of the box height from its bottom.
const INFO_LINE_BASELINES: [f64; 4] = [7.5, 5.0, 2.5, 0.5];

pub(crate) fn draw_decoration(
    pixmap: &mut Pixmap,
    figure: &Figure,
    decoration: &Decoration,
    text: &TextRenderer,
) -> ChartResult<()> {
    let config = &figure.config;
    match decoration {
        Decoration::Title { text: title } => {
            let rect = figure.viewport.rect;
            let style = TextStyle::new(config.pt(TITLE_PT), BLACK).align(HAlign::Left, VAlign::Bottom);
            text.draw(pixmap, title, rect.x as f32, (rect.y - config.pt(6.0) as f64) as f32, &style, None);
        }
        Decoration::InfoBox {
            lines,
            fill,
            fractions,
        } => {
            let rect = figure.fraction_rect(*fractions);
            fill_rect(pixmap, &rect, *fill);
            outline_rect(pixmap, &rect, BLACK, config.pt(0.8));
            let style = TextStyle::new(config.pt(INFO_PT), BLACK).align(HAlign::Left, VAlign::Bottom);
            for (line, baseline) in lines.iter().zip(INFO_LINE_BASELINES) {
                let x = rect.x + 0.25 * rect.width;
                let y = rect.bottom() - baseline / 10.0 * rect.height;
                text.draw(pixmap, line, x as f32, y as f32, &style, None);
            }
        }
        Decoration::Colorbar {
            rule,
            label,
            alpha,
            fractions,
        } => {
            draw_colorbar(pixmap, config, &figure.fraction_rect(*fractions), rule, label, *alpha, text);
        }
        Decoration::Legend { entries } => {
            draw_legend(pixmap, config, &figure.viewport.rect, entries, text);
        }
        Decoration::Inset(inset) => {
            draw_inset(pixmap, config, &figure.fraction_rect(inset.fractions), inset)?;
        }
        Decoration::Logo { image, fractions } => {
            let rect = figure.fraction_rect(*fractions);
            // Keep the logo's aspect ratio inside its box
            let scale = (rect.width / image.width() as f64).min(rect.height / image.height() as f64);
            let (w, h) = (image.width() as f64 * scale, image.height() as f64 * scale);
            let fitted = PixelRect::new(
                rect.x + (rect.width - w) / 2.0,
                rect.y + (rect.height - h) / 2.0,
                w,
                h,
            );
            draw_image_in_rect(pixmap, image, &fitted, 1.0, None);
        }
    }
    Ok(())
}

fn fill_rect(pixmap: &mut Pixmap, rect: &PixelRect, color: Rgba) {
    if let Ok(bounds) = to_skia_rect(rect) {
        pixmap.fill_rect(bounds, &solid_paint(color, 1.0), Transform::identity(), None);
    }
}

fn outline_rect(pixmap: &mut Pixmap, rect: &PixelRect, color: Rgba, width: f32) {
    if let Ok(bounds) = to_skia_rect(rect) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &tiny_skia::PathBuilder::from_rect(bounds),
            &solid_paint(color, 1.0),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}

fn format_tick(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Horizontal colourbar with equal-width bins, boundary ticks and a label.
fn draw_colorbar(
    pixmap: &mut Pixmap,
    config: &FigureConfig,
    rect: &PixelRect,
    rule: &ColorRule,
    label: &str,
    alpha: f32,
    text: &TextRenderer,
) {
    let bins: Vec<_> = rule.bins().collect();
    if bins.is_empty() {
        return;
    }
    let bin_width = rect.width / bins.len() as f64;

    for (i, &(_, _, color)) in bins.iter().enumerate() {
        let cell = PixelRect::new(rect.x + i as f64 * bin_width, rect.y, bin_width, rect.height);
        if let Ok(bounds) = to_skia_rect(&cell) {
            pixmap.fill_rect(bounds, &solid_paint(color, alpha), Transform::identity(), None);
        }
    }
    outline_rect(pixmap, rect, BLACK, config.pt(0.8));

    let tick_style = TextStyle::new(config.pt(COLORBAR_TICK_PT), BLACK).align(HAlign::Center, VAlign::Top);
    let tick_gap = config.pt(3.5) as f64;
    for (i, boundary) in rule.boundaries.iter().enumerate() {
        let x = rect.x + i as f64 * bin_width;
        text.draw(
            pixmap,
            &format_tick(*boundary),
            x as f32,
            (rect.bottom() + tick_gap) as f32,
            &tick_style,
            None,
        );
    }

    let (_, tick_height) = text.measure("0", config.pt(COLORBAR_TICK_PT));
    let label_style =
        TextStyle::new(config.pt(COLORBAR_LABEL_PT), BLACK).align(HAlign::Center, VAlign::Top);
    text.draw(
        pixmap,
        label,
        (rect.x + rect.width / 2.0) as f32,
        (rect.bottom() + 2.0 * tick_gap + tick_height as f64) as f32,
        &label_style,
        None,
    );
}

/// Legend box anchored at the lower-left corner of `plot`.
fn draw_legend(
    pixmap: &mut Pixmap,
    config: &FigureConfig,
    plot: &PixelRect,
    entries: &[LegendEntry],
    text: &TextRenderer,
) {
    if entries.is_empty() {
        return;
    }
    let font = config.pt(LEGEND_PT) as f64;
    let pad = 0.5 * font;
    let patch_w = 2.0 * font;
    let patch_h = 0.7 * font;
    let row_h = 1.3 * font;

    let label_w = entries
        .iter()
        .map(|e| text.measure(&e.label, font as f32).0 as f64)
        .fold(0.0, f64::max);
    let width = pad + patch_w + pad + label_w + pad;
    let height = pad + row_h * entries.len() as f64 + pad;
    let frame = PixelRect::new(plot.x + pad, plot.bottom() - pad - height, width, height);

    fill_rect(pixmap, &frame, WHITE);
    outline_rect(pixmap, &frame, [204, 204, 204, 255], config.pt(0.8));

    let label_style = TextStyle::new(font as f32, BLACK).align(HAlign::Left, VAlign::Middle);
    for (i, entry) in entries.iter().enumerate() {
        let center_y = frame.y + pad + row_h * (i as f64 + 0.5);
        let patch = PixelRect::new(frame.x + pad, center_y - patch_h / 2.0, patch_w, patch_h);
        if let Ok(bounds) = to_skia_rect(&patch) {
            pixmap.fill_rect(
                bounds,
                &solid_paint(entry.color, entry.opacity as f32),
                Transform::identity(),
                None,
            );
        }
        text.draw(
            pixmap,
            &entry.label,
            (patch.right() + pad) as f32,
            center_y as f32,
            &label_style,
            None,
        );
    }
}

fn draw_inset(
    pixmap: &mut Pixmap,
    config: &FigureConfig,
    rect: &PixelRect,
    inset: &Inset,
) -> ChartResult<()> {
    let projection = MapProjection::for_extent(&inset.extent, false);
    let (viewport, _) = adjust_map_ratio(projection, &inset.extent, *rect)?;
    let clip = rect_mask(pixmap.width(), pixmap.height(), rect)?;

    fill_rect(pixmap, rect, WHITE);
    fill_polygons(pixmap, &viewport, &inset.ocean, OCEAN_COLOR, 1.0, Some(&clip));
    for (lines, style) in &inset.lines {
        stroke_polylines(pixmap, &viewport, lines, style, 1.0, Some(&clip));
    }
    outline_rect(pixmap, rect, BLACK, config.pt(0.8));
    Ok(())
}
