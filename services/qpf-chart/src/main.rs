//! QPF chart renderer.
//!
//! Reads forecast fields stored as JSON and draws one of the precipitation
//! chart products, either into an output directory or in a viewer.

mod config_loader;
mod viewer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chart_common::GriddedField;
use clap::{Parser, Subcommand};
use renderer::charts::DEFAULT_FCS_LVL;
use renderer::{
    draw_cumulated_precip_evo, draw_gh_rain, draw_mslp_rain_snow, draw_rain_evo, ChartOptions,
    ChartOutcome, ChartResources, CumulatedEvoInputs, GhRainInputs, MslpRainSnowInputs, Output,
    RainEvoInputs,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config_loader::{load_chart_config, ChartConfig, LoggingConfig, Overrides};
use viewer::SystemViewer;

#[derive(Parser, Debug)]
#[command(name = "qpf-chart")]
#[command(about = "Render quantitative precipitation forecast charts")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "QPF_CHART_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Map extent: minlon,maxlon,minlat,maxlat
    #[arg(long, global = true, allow_hyphen_values = true)]
    extent: Option<String>,

    /// Use the global projection
    #[arg(long, global = true)]
    global: bool,

    /// Skip province, nation and river lines
    #[arg(long, global = true)]
    no_china: bool,

    /// Skip city labels
    #[arg(long, global = true)]
    no_city: bool,

    /// Skip the South China Sea inset
    #[arg(long, global = true)]
    no_sea_inset: bool,

    /// Date style of annotations: chinese or iso
    #[arg(long, global = true)]
    date_style: Option<String>,

    /// Write charts here instead of opening a viewer
    #[arg(short, long, env = "QPF_CHART_OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: ChartCommand,
}

#[derive(Subcommand, Debug)]
enum ChartCommand {
    /// Geopotential height over precipitation
    GhRain {
        #[arg(long)]
        gh: Option<PathBuf>,
        #[arg(long)]
        rain: Option<PathBuf>,
    },
    /// Sea-level pressure over rain, snow and sleet
    MslpRainSnow {
        #[arg(long)]
        rain: Option<PathBuf>,
        #[arg(long)]
        snow: Option<PathBuf>,
        #[arg(long)]
        sleet: Option<PathBuf>,
        #[arg(long)]
        mslp: Option<PathBuf>,
    },
    /// Evolution of the area above a rain threshold
    RainEvo {
        #[arg(long)]
        rain: PathBuf,
        /// Threshold in mm
        #[arg(long, default_value_t = DEFAULT_FCS_LVL)]
        fcs_lvl: f32,
    },
    /// Animation of consecutive precipitation steps
    CumulatedEvo {
        #[arg(long)]
        rain: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_chart_config(path)?,
        None => ChartConfig::default(),
    };
    config.apply(&Overrides {
        extent: args.extent.clone(),
        global: args.global,
        no_china: args.no_china,
        no_city: args.no_city,
        no_sea_inset: args.no_sea_inset,
        date_style: args.date_style.clone(),
        output_dir: args.output_dir.clone(),
        log_level: args.log_level.clone(),
    })?;

    init_tracing(&config.logging)?;
    info!(
        extent = ?config.chart.map_extent,
        global = config.chart.global,
        output_dir = ?config.output_dir,
        "Starting qpf-chart"
    );

    let resources =
        ChartResources::load(&config.resources).context("Failed to load chart resources")?;

    let mut viewer = SystemViewer::new(config.chart.figure.dpi);
    let output = match &config.output_dir {
        Some(dir) => Output::Directory(dir.clone()),
        None => Output::Display(&mut viewer),
    };

    match run(&args.command, &config.chart, &resources, output)? {
        ChartOutcome::Saved(path) => info!(path = %path.display(), "Chart written"),
        ChartOutcome::Displayed => info!("Chart displayed"),
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let level = match logging.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if logging.format == "pretty" {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }
    Ok(())
}

fn run(
    command: &ChartCommand,
    options: &ChartOptions,
    resources: &ChartResources,
    output: Output<'_>,
) -> Result<ChartOutcome> {
    match command {
        ChartCommand::GhRain { gh, rain } => {
            let gh = load_optional(gh.as_deref())?;
            let rain = load_optional(rain.as_deref())?;
            let inputs = GhRainInputs {
                gh: gh.as_ref(),
                rain: rain.as_ref(),
            };
            draw_gh_rain(inputs, options, resources, output).context("Failed to draw gh_rain chart")
        }
        ChartCommand::MslpRainSnow {
            rain,
            snow,
            sleet,
            mslp,
        } => {
            let rain = load_optional(rain.as_deref())?;
            let snow = load_optional(snow.as_deref())?;
            let sleet = load_optional(sleet.as_deref())?;
            let mslp = load_optional(mslp.as_deref())?;
            let inputs = MslpRainSnowInputs {
                rain: rain.as_ref(),
                snow: snow.as_ref(),
                sleet: sleet.as_ref(),
                mslp: mslp.as_ref(),
            };
            draw_mslp_rain_snow(inputs, options, resources, output)
                .context("Failed to draw mslp_rain_snow chart")
        }
        ChartCommand::RainEvo { rain, fcs_lvl } => {
            let rain = load_field(rain)?;
            let inputs = RainEvoInputs {
                rain: Some(&rain),
                fcs_lvl: *fcs_lvl,
            };
            draw_rain_evo(inputs, options, resources, output).context("Failed to draw rain_evo chart")
        }
        ChartCommand::CumulatedEvo { rain } => {
            let rain = load_field(rain)?;
            let inputs = CumulatedEvoInputs { rain: Some(&rain) };
            draw_cumulated_precip_evo(inputs, options, resources, output)
                .context("Failed to draw cumulated_precip_evo chart")
        }
    }
}

/// Read a `GriddedField` JSON document.
fn load_field(path: &Path) -> Result<GriddedField> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read field from {:?}", path))?;
    let field: GriddedField = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse field JSON from {:?}", path))?;
    info!(
        path = %path.display(),
        kind = field.name(),
        nx = field.nx(),
        ny = field.ny(),
        steps = field.steps,
        "Loaded field"
    );
    Ok(field)
}

fn load_optional(path: Option<&Path>) -> Result<Option<GriddedField>> {
    path.map(load_field).transpose()
}
