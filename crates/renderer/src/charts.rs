//! Chart entry points.
//!
//! Each `draw_*` function validates its inputs, builds a [`Figure`] with the
//! data layers and map furniture of one product, renders it and hands the
//! result to an [`Output`]. The builders (`*_figure`, `cumulated_precip_frames`)
//! stop before rendering.

use std::time::Instant;

use chart_common::{ChartError, ChartResult, DateStyle, ForecastTime, GriddedField, MapExtent};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animation::{frame_figure, frame_states, ANIMATION_FRAMES, FRAME_DELAY_MS};
use crate::annotation::{
    background_layer, boundary_layers, city_layer, colorbar, colorbar_fractions, evolution_info_lines,
    forecast_info_lines, full_colorbar_fractions, gridline_layer, info_box, legend, logo, ocean_layer,
    south_china_sea_inset, title, INFO_FILL,
};
use crate::colormap::{mask_light_precipitation, ColorRule};
use crate::contour::{contour_field, geopotential_height_levels, sea_level_pressure_levels, ContourConfig};
use crate::evolution::composite_evolution;
use crate::figure::{Figure, FigureConfig, LayerKind, MapLayer, PLOT_AREA};
use crate::output::{deliver_animation, deliver_image, ChartKind, ChartOutcome, Output};
use crate::resources::ChartResources;
use crate::smoothing::gaussian_filter;

/// Rain amount (mm) outlined by the rain-extent evolution unless told otherwise.
pub const DEFAULT_FCS_LVL: f32 = 4.0;

/// Smoothing applied to sea-level pressure before contouring (grid cells).
pub const MSLP_SMOOTHING_SIGMA: f64 = 5.0;

const CONTOUR_COLOR: [u8; 4] = [0, 0, 0, 255];
const CONTOUR_WIDTH_PT: f64 = 2.0;
const CONTOUR_LABEL_PT: f64 = 20.0;
const PRECIP_ALPHA: f32 = 0.5;

/// Options shared by every chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub map_extent: MapExtent,
    /// Kept for callers that pass it; rendering draws the native grid.
    pub regrid_shape: u32,
    /// Draw province, nation and river lines
    pub add_china: bool,
    pub city: bool,
    pub south_china_sea: bool,
    /// Robinson projection instead of Albers
    pub global: bool,
    pub date_style: DateStyle,
    pub figure: FigureConfig,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            map_extent: MapExtent::default(),
            regrid_shape: 20,
            add_china: true,
            city: true,
            south_china_sea: true,
            global: false,
            date_style: DateStyle::default(),
            figure: FigureConfig::default(),
        }
    }
}

/// Fields of the height / precipitation chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhRainInputs<'a> {
    pub gh: Option<&'a GriddedField>,
    pub rain: Option<&'a GriddedField>,
}

/// Fields of the sea-level pressure / precipitation type chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct MslpRainSnowInputs<'a> {
    pub rain: Option<&'a GriddedField>,
    pub snow: Option<&'a GriddedField>,
    pub sleet: Option<&'a GriddedField>,
    pub mslp: Option<&'a GriddedField>,
}

/// Field and threshold of the rain-extent evolution.
#[derive(Debug, Clone, Copy)]
pub struct RainEvoInputs<'a> {
    pub rain: Option<&'a GriddedField>,
    /// Threshold (mm) whose exceedance area is drawn
    pub fcs_lvl: f32,
}

impl Default for RainEvoInputs<'_> {
    fn default() -> Self {
        Self {
            rain: None,
            fcs_lvl: DEFAULT_FCS_LVL,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CumulatedEvoInputs<'a> {
    pub rain: Option<&'a GriddedField>,
}

/// Drawing order of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZOrders {
    pub precipitation: i32,
    pub contour: i32,
    pub boundaries: i32,
    pub grid: i32,
    pub city: i32,
}

pub const GH_RAIN_ZORDERS: ZOrders = ZOrders {
    precipitation: 1,
    contour: 3,
    boundaries: 3,
    grid: 1,
    city: 2,
};

pub const MSLP_RAIN_SNOW_ZORDERS: ZOrders = ZOrders {
    precipitation: 3,
    contour: 3,
    boundaries: 1,
    grid: 1,
    city: 110,
};

pub const RAIN_EVO_ZORDERS: ZOrders = ZOrders {
    precipitation: 3,
    contour: 3,
    boundaries: 1,
    grid: 1,
    city: 110,
};

pub const CUMULATED_ZORDERS: ZOrders = ZOrders {
    precipitation: 1,
    contour: 3,
    boundaries: 3,
    grid: 1,
    city: 2,
};

// ============================================================================
// Entry points
// ============================================================================

/// A static chart ready to render, with the forecast time it is filed under.
#[derive(Debug, Clone)]
pub struct PreparedChart {
    pub figure: Figure,
    pub forecast: ForecastTime,
}

/// Animation frames ready to render, filed under the first step.
#[derive(Debug, Clone)]
pub struct PreparedAnimation {
    pub frames: Vec<Figure>,
    pub forecast: ForecastTime,
}

/// Geopotential height contours over accumulated precipitation.
pub fn draw_gh_rain(
    inputs: GhRainInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
    output: Output<'_>,
) -> ChartResult<ChartOutcome> {
    let started = Instant::now();
    let prepared = gh_rain_figure(inputs, options, resources)?;
    render_static(ChartKind::GhRain, prepared, options, resources, output, started)
}

/// Smoothed sea-level pressure over rain, snow and sleet.
pub fn draw_mslp_rain_snow(
    inputs: MslpRainSnowInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
    output: Output<'_>,
) -> ChartResult<ChartOutcome> {
    let started = Instant::now();
    let prepared = mslp_rain_snow_figure(inputs, options, resources)?;
    render_static(ChartKind::MslpRainSnow, prepared, options, resources, output, started)
}

/// Area exceeding `fcs_lvl` at every step, composited from faint to strong.
pub fn draw_rain_evo(
    inputs: RainEvoInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
    output: Output<'_>,
) -> ChartResult<ChartOutcome> {
    let started = Instant::now();
    let prepared = rain_evo_figure(inputs, options, resources)?;
    render_static(ChartKind::RainEvo, prepared, options, resources, output, started)
}

/// Four-frame animation of the precipitation of consecutive steps.
pub fn draw_cumulated_precip_evo(
    inputs: CumulatedEvoInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
    output: Output<'_>,
) -> ChartResult<ChartOutcome> {
    let started = Instant::now();
    let chart = ChartKind::CumulatedPrecipEvo;
    let prepared = cumulated_precip_frames(inputs, options, resources)?;

    let mut frames = Vec::with_capacity(prepared.frames.len());
    for (index, figure) in prepared.frames.iter().enumerate() {
        frames.push(figure.render(&resources.text)?);
        debug!(chart = chart.name(), frame = index, "Rendered frame");
    }

    let outcome = deliver_animation(
        output,
        chart,
        &prepared.forecast,
        &options.date_style,
        &frames,
        FRAME_DELAY_MS,
    )?;
    record_render(chart, started);
    Ok(outcome)
}

// ============================================================================
// Figure builders
// ============================================================================

pub fn gh_rain_figure(
    inputs: GhRainInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
) -> ChartResult<PreparedChart> {
    let source = inputs
        .gh
        .or(inputs.rain)
        .ok_or_else(|| ChartError::NoFields(ChartKind::GhRain.name().to_string()))?;
    validate_static(&[inputs.gh, inputs.rain])?;
    let model = source.model()?;
    let forecast = source.forecast_time(0)?;

    let level = inputs
        .gh
        .map(|gh| {
            gh.meta
                .level_hpa
                .ok_or_else(|| ChartError::missing(gh.name(), "level_hpa"))
        })
        .transpose()?;
    let atime = inputs.rain.map(|r| r.accumulation_hours()).transpose()?;

    let z = GH_RAIN_ZORDERS;
    let mut figure = base_figure(options, resources, options.global, &z)?;

    if let (Some(rain), Some(atime)) = (inputs.rain, atime) {
        figure.add_layer(precipitation_layer(rain, ColorRule::qpf_nws(atime), z.precipitation)?);
    }
    if let Some(gh) = inputs.gh {
        let config = contour_config(geopotential_height_levels(), &figure.config);
        let contours = contour_field(gh, first_step(gh)?, &config);
        figure.add_layer(MapLayer::new(
            gh.name(),
            z.contour,
            LayerKind::LineContour { contours, config },
        ));
    }

    figure.add_decoration(title(gh_rain_title(model, level, atime)));
    figure.add_decoration(info_box(forecast_info_lines(&forecast, &options.date_style), INFO_FILL));
    if let Some(atime) = atime {
        figure.add_decoration(colorbar(
            ColorRule::qpf_nws(atime),
            format!("{}h precipitation (mm)", atime),
            full_colorbar_fractions(),
        ));
    }
    finish_decorations(&mut figure, options, resources);

    Ok(PreparedChart { figure, forecast })
}

pub fn mslp_rain_snow_figure(
    inputs: MslpRainSnowInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
) -> ChartResult<PreparedChart> {
    let source = inputs
        .mslp
        .or(inputs.rain)
        .or(inputs.snow)
        .or(inputs.sleet)
        .ok_or_else(|| ChartError::NoFields(ChartKind::MslpRainSnow.name().to_string()))?;
    validate_static(&[inputs.rain, inputs.snow, inputs.sleet, inputs.mslp])?;
    let model = source.model()?;
    let forecast = source.forecast_time(0)?;

    let z = MSLP_RAIN_SNOW_ZORDERS;
    let mut figure = base_figure(options, resources, options.global, &z)?;

    // Each precipitation type brings its layer and its colourbar
    type Table = fn(u32) -> ColorRule;
    let types: [(Option<&GriddedField>, Table, f64, &str); 3] = [
        (inputs.rain, ColorRule::rain_nws, 0.65, "雨 (mm)"),
        (inputs.snow, ColorRule::snow_nws, 0.32, "雪 (mm)"),
        (inputs.sleet, ColorRule::sleet_nws, 0.0, "雨夹雪 (mm)"),
    ];
    let mut colorbars = Vec::new();
    for (field, table, offset, label) in types {
        let Some(field) = field else { continue };
        let rule = table(field.accumulation_hours()?);
        figure.add_layer(precipitation_layer(field, rule.clone(), z.precipitation)?);
        colorbars.push(colorbar(rule, label, colorbar_fractions(offset, PLOT_AREA[2] / 4.0)));
    }

    if let Some(mslp) = inputs.mslp {
        let smoothed = gaussian_filter(first_step(mslp)?, mslp.nx(), mslp.ny(), MSLP_SMOOTHING_SIGMA);
        let config = contour_config(sea_level_pressure_levels(), &figure.config);
        let contours = contour_field(mslp, &smoothed, &config);
        figure.add_layer(MapLayer::new(
            mslp.name(),
            z.contour,
            LayerKind::LineContour { contours, config },
        ));
    }

    let atime = [inputs.rain, inputs.snow, inputs.sleet]
        .into_iter()
        .flatten()
        .next()
        .map(|f| f.accumulation_hours())
        .transpose()?;
    figure.add_decoration(title(mslp_rain_snow_title(model, inputs.mslp.is_some(), atime)));
    figure.add_decoration(info_box(forecast_info_lines(&forecast, &options.date_style), INFO_FILL));
    // Left to right: sleet, snow, rain
    for bar in colorbars.into_iter().rev() {
        figure.add_decoration(bar);
    }
    finish_decorations(&mut figure, options, resources);

    Ok(PreparedChart { figure, forecast })
}

pub fn rain_evo_figure(
    inputs: RainEvoInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
) -> ChartResult<PreparedChart> {
    let rain = inputs
        .rain
        .ok_or_else(|| ChartError::NoFields(ChartKind::RainEvo.name().to_string()))?;
    let (model, t_gap, forecasts) = validate_evolution(rain)?;
    let (first, last) = time_span(rain, &forecasts)?;

    let z = RAIN_EVO_ZORDERS;
    let mut figure = base_figure(options, resources, options.global, &z)?;

    let composite = composite_evolution(rain, inputs.fcs_lvl, z.precipitation, &options.date_style)?;
    for layer in composite.layers {
        figure.add_layer(layer);
    }

    figure.add_decoration(title(format!(
        "[{}] 预报逐{}小时{}mm降水范围演变",
        model, t_gap, inputs.fcs_lvl
    )));
    figure.add_decoration(info_box(
        evolution_info_lines(&first, &last, &options.date_style),
        INFO_FILL,
    ));
    figure.add_decoration(legend(composite.legend));
    finish_decorations(&mut figure, options, resources);

    Ok(PreparedChart {
        figure,
        forecast: first,
    })
}

/// One figure per animation frame. Always drawn on the regional projection.
pub fn cumulated_precip_frames(
    inputs: CumulatedEvoInputs<'_>,
    options: &ChartOptions,
    resources: &ChartResources,
) -> ChartResult<PreparedAnimation> {
    let rain = inputs
        .rain
        .ok_or_else(|| ChartError::NoFields(ChartKind::CumulatedPrecipEvo.name().to_string()))?;
    let (model, t_gap, forecasts) = validate_evolution(rain)?;
    let states = frame_states(rain, ANIMATION_FRAMES)?;
    let (first, last) = time_span(rain, &forecasts)?;

    let z = CUMULATED_ZORDERS;
    let rule = ColorRule::qpf_nws(t_gap);
    let mut base = base_figure(options, resources, false, &z)?;
    base.add_decoration(title(format!(
        "[{}] {}至{}时效预报逐{}小时降水演变",
        model,
        first.lead_whole_hours(),
        last.lead_whole_hours(),
        t_gap
    )));
    base.add_decoration(colorbar(
        rule.clone(),
        format!("{}h precipitation (mm)", t_gap),
        full_colorbar_fractions(),
    ));
    finish_decorations(&mut base, options, resources);

    let frames = states
        .iter()
        .map(|state| frame_figure(&base, rain, &rule, state, z.precipitation, &options.date_style))
        .collect::<ChartResult<Vec<_>>>()?;

    Ok(PreparedAnimation {
        frames,
        forecast: first,
    })
}

// ============================================================================
// Titles
// ============================================================================

/// `[model] <level>hPa 位势高度场, <atime>小时降水`, keeping the parts whose
/// field is present.
pub fn gh_rain_title(model: &str, level_hpa: Option<f64>, atime: Option<u32>) -> String {
    let mut parts = Vec::new();
    if let Some(level) = level_hpa {
        parts.push(format!("{}hPa 位势高度场", level));
    }
    if let Some(atime) = atime {
        parts.push(format!("{}小时降水", atime));
    }
    format!("[{}] {}", model, parts.join(", "))
}

pub fn mslp_rain_snow_title(model: &str, has_mslp: bool, atime: Option<u32>) -> String {
    let mut parts = Vec::new();
    if has_mslp {
        parts.push("海平面气压".to_string());
    }
    if let Some(atime) = atime {
        parts.push(format!("{}小时降水", atime));
    }
    format!("[{}] {}", model, parts.join(", "))
}

// ============================================================================
// Helpers
// ============================================================================

/// Shape of every present field; accumulation period of precipitation types.
fn validate_static(fields: &[Option<&GriddedField>]) -> ChartResult<()> {
    for field in fields.iter().flatten() {
        field.validate()?;
        if field.kind.is_precipitation_type() {
            field.accumulation_hours()?;
        }
    }
    Ok(())
}

/// Model, time gap and per-step forecast times of an evolution field.
fn validate_evolution(field: &GriddedField) -> ChartResult<(&str, u32, Vec<ForecastTime>)> {
    field.validate()?;
    if field.steps == 0 || field.meta.forecast_periods.is_empty() {
        return Err(ChartError::EmptyTimeAxis(field.name().to_string()));
    }
    let model = field.model()?;
    let t_gap = field.time_gap_hours()?;
    let forecasts = field.forecast_times()?;
    Ok((model, t_gap, forecasts))
}

fn first_step(field: &GriddedField) -> ChartResult<&[f32]> {
    field
        .step(0)
        .ok_or_else(|| ChartError::EmptyTimeAxis(field.name().to_string()))
}

fn time_span(field: &GriddedField, forecasts: &[ForecastTime]) -> ChartResult<(ForecastTime, ForecastTime)> {
    match (forecasts.first(), forecasts.last()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(ChartError::EmptyTimeAxis(field.name().to_string())),
    }
}

/// Masked first step of a precipitation-type field as a half-transparent mesh.
fn precipitation_layer(field: &GriddedField, rule: ColorRule, zorder: i32) -> ChartResult<MapLayer> {
    let mut slice = field.slice_step(0)?;
    mask_light_precipitation(&mut slice.data);
    Ok(MapLayer::new(field.name(), zorder, LayerKind::RasterMesh { field: slice, rule }).with_alpha(PRECIP_ALPHA))
}

fn contour_config(levels: Vec<f32>, figure: &FigureConfig) -> ContourConfig {
    ContourConfig {
        levels,
        line_width: figure.pt(CONTOUR_WIDTH_PT),
        line_color: CONTOUR_COLOR,
        labels_enabled: true,
        label_font_size: figure.pt(CONTOUR_LABEL_PT),
        ..Default::default()
    }
}

/// Projection, background, ocean, boundaries, grid and cities.
fn base_figure(
    options: &ChartOptions,
    resources: &ChartResources,
    global: bool,
    z: &ZOrders,
) -> ChartResult<Figure> {
    options.map_extent.validate()?;
    let mut figure = Figure::new(options.figure, &options.map_extent, global)?;
    debug!(
        realised = ?figure.realised_extent,
        global,
        "Set up map projection"
    );

    if let Some(background) = &resources.background {
        figure.add_layer(background_layer(background));
    }
    if let Some(ocean) = ocean_layer(&resources.basemap) {
        figure.add_layer(ocean);
    }
    for layer in boundary_layers(&resources.basemap, options.add_china, z.boundaries, &options.figure) {
        figure.add_layer(layer);
    }
    figure.add_layer(gridline_layer(z.grid, &options.figure));
    if options.city {
        let realised = figure.realised_extent;
        if let Some(cities) = city_layer(&resources.cities, &realised, z.city, &options.figure) {
            figure.add_layer(cities);
        }
    }
    Ok(figure)
}

/// Inset and logo, drawn after the chart's own decorations.
fn finish_decorations(figure: &mut Figure, options: &ChartOptions, resources: &ChartResources) {
    if options.south_china_sea {
        figure.add_decoration(south_china_sea_inset(&resources.basemap, &options.figure));
    }
    if let Some(image) = &resources.logo {
        figure.add_decoration(logo(image));
    }
}

fn render_static(
    chart: ChartKind,
    prepared: PreparedChart,
    options: &ChartOptions,
    resources: &ChartResources,
    output: Output<'_>,
    started: Instant,
) -> ChartResult<ChartOutcome> {
    let image = prepared.figure.render(&resources.text)?;
    let outcome = deliver_image(
        output,
        chart,
        &prepared.forecast,
        &options.date_style,
        &image,
        options.figure.dpi,
    )?;
    record_render(chart, started);
    Ok(outcome)
}

fn record_render(chart: ChartKind, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    counter!("qpf_charts_rendered_total", "chart" => chart.name()).increment(1);
    histogram!("qpf_chart_render_seconds", "chart" => chart.name()).record(elapsed);
    info!(chart = chart.name(), elapsed_ms = elapsed * 1000.0, "Rendered chart");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Decoration;
    use crate::output::Viewer;
    use chart_common::FieldKind;
    use image::RgbaImage;
    use test_utils::{evolution_field, extents, height_field, precipitation_field, pressure_field};

    #[derive(Default)]
    struct CapturingViewer {
        images: Vec<RgbaImage>,
        frames: usize,
    }

    impl Viewer for CapturingViewer {
        fn show_image(&mut self, image: &RgbaImage, _title: &str) -> ChartResult<()> {
            self.images.push(image.clone());
            Ok(())
        }

        fn show_animation(&mut self, frames: &[RgbaImage], _delay_ms: u32, _title: &str) -> ChartResult<()> {
            self.frames = frames.len();
            Ok(())
        }
    }

    fn small_options() -> ChartOptions {
        ChartOptions {
            map_extent: extents::JIANGNAN,
            figure: FigureConfig {
                width_in: 4.0,
                height_in: 2.0,
                dpi: 50,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_gh_rain_title_fragments() {
        assert_eq!(
            gh_rain_title("ECMWF", Some(500.0), Some(24)),
            "[ECMWF] 500hPa 位势高度场, 24小时降水"
        );
        assert_eq!(gh_rain_title("ECMWF", None, Some(6)), "[ECMWF] 6小时降水");
        assert_eq!(gh_rain_title("GRAPES", Some(850.0), None), "[GRAPES] 850hPa 位势高度场");
    }

    #[test]
    fn test_mslp_title_fragments() {
        assert_eq!(
            mslp_rain_snow_title("ECMWF", true, Some(24)),
            "[ECMWF] 海平面气压, 24小时降水"
        );
        assert_eq!(mslp_rain_snow_title("ECMWF", true, None), "[ECMWF] 海平面气压");
    }

    #[test]
    fn test_no_fields_is_error() {
        let mut viewer = CapturingViewer::default();
        let err = draw_gh_rain(
            GhRainInputs::default(),
            &small_options(),
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::NoFields(_)));
        assert!(viewer.images.is_empty());
    }

    #[test]
    fn test_missing_model_is_error() {
        let mut rain = precipitation_field(FieldKind::Precipitation, &extents::JIANGNAN, 16, 14);
        rain.meta.model = None;
        let mut viewer = CapturingViewer::default();
        let err = draw_gh_rain(
            GhRainInputs {
                gh: None,
                rain: Some(&rain),
            },
            &small_options(),
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::MissingAttribute { ref attribute, .. } if attribute == "model"));
    }

    #[test]
    fn test_gh_rain_renders_to_viewer() {
        let gh = height_field(&extents::JIANGNAN, 16, 14);
        let rain = precipitation_field(FieldKind::Precipitation, &extents::JIANGNAN, 16, 14);
        let options = small_options();
        let mut viewer = CapturingViewer::default();
        let outcome = draw_gh_rain(
            GhRainInputs {
                gh: Some(&gh),
                rain: Some(&rain),
            },
            &options,
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap();
        assert_eq!(outcome, ChartOutcome::Displayed);
        assert_eq!(viewer.images.len(), 1);
        assert_eq!(viewer.images[0].dimensions(), (200, 100));
    }

    #[test]
    fn test_mslp_without_precipitation() {
        let mslp = pressure_field(&extents::JIANGNAN, 16, 14);
        let mut viewer = CapturingViewer::default();
        draw_mslp_rain_snow(
            MslpRainSnowInputs {
                mslp: Some(&mslp),
                ..Default::default()
            },
            &small_options(),
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap();
        assert_eq!(viewer.images.len(), 1);
    }

    #[test]
    fn test_absent_rain_adds_no_layer_or_colorbar() {
        let gh = height_field(&extents::JIANGNAN, 16, 14);
        let prepared = gh_rain_figure(
            GhRainInputs {
                gh: Some(&gh),
                rain: None,
            },
            &small_options(),
            &ChartResources::default(),
        )
        .unwrap();
        let figure = &prepared.figure;
        assert!(figure.has_layer("gh"));
        assert!(!figure.has_layer("rain"));
        assert!(!figure
            .decorations()
            .iter()
            .any(|d| matches!(d, Decoration::Colorbar { .. })));
        match &figure.decorations()[0] {
            Decoration::Title { text } => assert_eq!(text, "[ECMWF] 500hPa 位势高度场"),
            other => panic!("unexpected decoration {:?}", other),
        }
    }

    #[test]
    fn test_snow_and_sleet_mask_light_cells() {
        let mut snow = precipitation_field(FieldKind::Snow, &extents::JIANGNAN, 24, 20);
        let mut sleet = precipitation_field(FieldKind::Sleet, &extents::JIANGNAN, 24, 20);
        for (i, v) in snow.data.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 0.1 } else { 2.0 };
        }
        for (i, v) in sleet.data.iter_mut().enumerate() {
            *v = if i % 3 == 0 { 0.05 } else { 0.5 };
        }

        let prepared = mslp_rain_snow_figure(
            MslpRainSnowInputs {
                snow: Some(&snow),
                sleet: Some(&sleet),
                ..Default::default()
            },
            &small_options(),
            &ChartResources::default(),
        )
        .unwrap();

        for source in [&snow, &sleet] {
            let layer = prepared
                .figure
                .layers()
                .iter()
                .find(|l| l.name == source.name())
                .expect("precipitation layer");
            let LayerKind::RasterMesh { field, rule } = &layer.kind else {
                panic!("{} should be a raster mesh", source.name());
            };
            for (shown, raw) in field.data.iter().zip(&source.data) {
                if *raw <= 0.1 {
                    assert!(shown.is_nan());
                    assert_eq!(rule.color_for(*shown), None);
                } else {
                    assert_eq!(shown, raw);
                }
            }
        }
    }

    #[test]
    fn test_mslp_colorbars_left_to_right() {
        let rain = precipitation_field(FieldKind::Precipitation, &extents::JIANGNAN, 16, 14);
        let sleet = precipitation_field(FieldKind::Sleet, &extents::JIANGNAN, 16, 14);
        let prepared = mslp_rain_snow_figure(
            MslpRainSnowInputs {
                rain: Some(&rain),
                sleet: Some(&sleet),
                ..Default::default()
            },
            &small_options(),
            &ChartResources::default(),
        )
        .unwrap();
        let labels: Vec<&str> = prepared
            .figure
            .decorations()
            .iter()
            .filter_map(|d| match d {
                Decoration::Colorbar { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["雨夹雪 (mm)", "雨 (mm)"]);
        assert!(prepared.figure.has_layer("rain"));
        assert!(prepared.figure.has_layer("sleet"));
        assert!(!prepared.figure.has_layer("snow"));
    }

    #[test]
    fn test_rain_evo_filed_under_first_step() {
        let rain = evolution_field(&extents::JIANGNAN, 16, 14, 5, 6);
        let prepared = rain_evo_figure(
            RainEvoInputs {
                rain: Some(&rain),
                ..Default::default()
            },
            &small_options(),
            &ChartResources::default(),
        )
        .unwrap();
        assert_eq!(prepared.forecast.lead_hours, 6.0);
        let legend = prepared
            .figure
            .decorations()
            .iter()
            .find_map(|d| match d {
                Decoration::Legend { entries } => Some(entries.len()),
                _ => None,
            });
        assert_eq!(legend, Some(5));
        match &prepared.figure.decorations()[0] {
            Decoration::Title { text } => assert_eq!(text, "[ECMWF] 预报逐6小时4mm降水范围演变"),
            other => panic!("unexpected decoration {:?}", other),
        }
    }

    #[test]
    fn test_cumulated_frames_ignore_global() {
        let rain = evolution_field(&extents::JIANGNAN, 16, 14, 4, 3);
        let options = ChartOptions {
            global: true,
            ..small_options()
        };
        let prepared = cumulated_precip_frames(
            CumulatedEvoInputs { rain: Some(&rain) },
            &options,
            &ChartResources::default(),
        )
        .unwrap();
        assert_eq!(prepared.frames.len(), ANIMATION_FRAMES);
        let regional = Figure::new(options.figure, &options.map_extent, false).unwrap();
        assert_eq!(prepared.frames[0].realised_extent, regional.realised_extent);
        match &prepared.frames[0].decorations()[0] {
            Decoration::Title { text } => assert_eq!(text, "[ECMWF] 3至12时效预报逐3小时降水演变"),
            other => panic!("unexpected decoration {:?}", other),
        }
    }

    #[test]
    fn test_base_figure_layers() {
        let options = small_options();
        let figure = base_figure(&options, &ChartResources::default(), false, &GH_RAIN_ZORDERS).unwrap();
        // Empty basemap and city list leave only the grid
        assert!(figure.has_layer("grid"));
        assert_eq!(figure.layers().len(), 1);
    }

    #[test]
    fn test_finish_decorations_respects_options() {
        let mut options = small_options();
        let resources = ChartResources::default();
        let mut figure = base_figure(&options, &resources, false, &GH_RAIN_ZORDERS).unwrap();
        finish_decorations(&mut figure, &options, &resources);
        assert!(matches!(figure.decorations(), [Decoration::Inset(_)]));

        options.south_china_sea = false;
        let mut figure = base_figure(&options, &resources, false, &GH_RAIN_ZORDERS).unwrap();
        finish_decorations(&mut figure, &options, &resources);
        assert!(figure.decorations().is_empty());
    }

    #[test]
    fn test_cumulated_needs_four_steps() {
        let rain = evolution_field(&extents::JIANGNAN, 16, 14, 3, 6);
        let mut viewer = CapturingViewer::default();
        let err = draw_cumulated_precip_evo(
            CumulatedEvoInputs { rain: Some(&rain) },
            &small_options(),
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::InsufficientSteps { needed: 4, found: 3 }));
        assert_eq!(viewer.frames, 0);
    }

    #[test]
    fn test_cumulated_shows_four_frames() {
        let rain = evolution_field(&extents::JIANGNAN, 16, 14, 6, 6);
        let mut viewer = CapturingViewer::default();
        draw_cumulated_precip_evo(
            CumulatedEvoInputs { rain: Some(&rain) },
            &small_options(),
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap();
        assert_eq!(viewer.frames, ANIMATION_FRAMES);
    }

    #[test]
    fn test_rain_evo_requires_time_gap() {
        let mut rain = evolution_field(&extents::JIANGNAN, 16, 14, 4, 6);
        rain.meta.time_gap_hours = None;
        let mut viewer = CapturingViewer::default();
        let err = draw_rain_evo(
            RainEvoInputs {
                rain: Some(&rain),
                ..Default::default()
            },
            &small_options(),
            &ChartResources::default(),
            Output::Display(&mut viewer),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::MissingAttribute { ref attribute, .. } if attribute == "time_gap_hours"));
    }

    #[test]
    fn test_options_default() {
        let options = ChartOptions::default();
        assert!(options.add_china && options.city && options.south_china_sea);
        assert!(!options.global);
        assert_eq!(options.figure.dpi, 200);
    }
}
