//! Rendering of quantitative precipitation forecast charts.
//!
//! The four products are drawn by the functions in [`charts`]; the other
//! modules provide the pieces they are assembled from.

pub mod animation;
pub mod annotation;
pub mod charts;
pub mod colormap;
pub mod contour;
pub mod evolution;
pub mod figure;
pub mod output;
pub mod png;
pub mod resources;
pub mod smoothing;
pub mod text;

pub use charts::{
    draw_cumulated_precip_evo, draw_gh_rain, draw_mslp_rain_snow, draw_rain_evo, ChartOptions,
    CumulatedEvoInputs, GhRainInputs, MslpRainSnowInputs, RainEvoInputs,
};
pub use colormap::ColorRule;
pub use figure::{Figure, FigureConfig};
pub use output::{chart_filename, ChartKind, ChartOutcome, Output, Viewer};
pub use resources::{ChartResources, ResourcePaths};
pub use text::TextRenderer;
