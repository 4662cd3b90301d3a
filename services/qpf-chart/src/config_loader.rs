//! Configuration loader for qpf-chart
//!
//! Loads and validates the YAML chart configuration:
//! - resource paths (font, basemap, cities, logo, background)
//! - chart defaults (extent, map furniture switches, figure size)
//! - output directory and logging
//!
//! Supports environment variable substitution using ${VAR} syntax.

use anyhow::{Context, Result};
use chart_common::{DateStyle, MapExtent};
use renderer::{ChartOptions, ResourcePaths};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Chart Configuration (qpf-chart.yaml)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub resources: ResourcePaths,
    pub chart: ChartOptions,
    /// Where charts are written; unset opens them in a viewer
    pub output_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub extent: Option<String>,
    pub global: bool,
    pub no_china: bool,
    pub no_city: bool,
    pub no_sea_inset: bool,
    pub date_style: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ChartConfig {
    /// Apply command-line overrides, then validate the result.
    pub fn apply(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(extent) = &overrides.extent {
            self.chart.map_extent = MapExtent::from_arg_string(extent)
                .with_context(|| format!("Invalid --extent {}", extent))?;
        }
        if overrides.global {
            self.chart.global = true;
        }
        if overrides.no_china {
            self.chart.add_china = false;
        }
        if overrides.no_city {
            self.chart.city = false;
        }
        if overrides.no_sea_inset {
            self.chart.south_china_sea = false;
        }
        if let Some(style) = &overrides.date_style {
            self.chart.date_style = DateStyle::parse(style)
                .with_context(|| format!("Unknown date style: {}", style))?;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.to_lowercase();
        }
        validate_chart_config(self)
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse the chart config with environment variable substitution
pub fn load_chart_config<P: AsRef<Path>>(path: P) -> Result<ChartConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read chart config from {:?}", path.as_ref()))?;

    parse_chart_config(&content)
        .with_context(|| format!("Failed to load chart config from {:?}", path.as_ref()))
}

fn parse_chart_config(content: &str) -> Result<ChartConfig> {
    let expanded = expand_env_vars(content)?;

    let mut config: ChartConfig =
        serde_yaml::from_str(&expanded).context("Failed to parse chart config YAML")?;
    drop_empty_paths(&mut config.resources);
    if config.output_dir.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
        config.output_dir = None;
    }

    validate_chart_config(&config)?;

    Ok(config)
}

/// `${VAR:-}` leaves an empty path behind; treat it as unset.
fn drop_empty_paths(paths: &mut ResourcePaths) {
    for slot in [
        &mut paths.font,
        &mut paths.basemap,
        &mut paths.cities,
        &mut paths.logo,
        &mut paths.background,
    ] {
        if slot.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            *slot = None;
        }
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` in the chart YAML before parsing.
///
/// Resource paths are the usual targets (`font: ${QPF_FONT}`); a default of
/// `${VAR:-}` leaves an empty value that [`drop_empty_paths`] turns into unset.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Value of one `VAR` or `VAR:-default` expression; an unset `VAR` with no
/// default is an error.
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_chart_config(config: &ChartConfig) -> Result<()> {
    config.chart.map_extent.validate()?;
    config.chart.figure.validate()?;

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    anyhow::ensure!(
        valid_levels.contains(&config.logging.level.as_str()),
        "Invalid log level: {}. Must be one of: {:?}",
        config.logging.level,
        valid_levels
    );

    let valid_formats = ["json", "pretty"];
    anyhow::ensure!(
        valid_formats.contains(&config.logging.format.as_str()),
        "Invalid log format: {}. Must be one of: {:?}",
        config.logging.format,
        valid_formats
    );

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
