//! Static map resources: boundary lines, cities, fonts and images.
//!
//! Everything here is loaded once per process and shared by every chart.

use std::path::{Path, PathBuf};

use chart_common::{ChartError, ChartResult, MapExtent};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::text::TextRenderer;

/// A line or ring of (lon, lat) vertices.
pub type Polyline = Vec<(f64, f64)>;

/// Highest rank still shown when the map is zoomed out.
pub const MAJOR_CITY_RANK: u8 = 1;

/// Boundary and ocean geometry.
///
/// Loaded from a JSON document with one array of polylines per layer:
/// `{"coastline": [[[lon, lat], ...], ...], "province": ..., "ocean": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Basemap {
    #[serde(default)]
    pub coastline: Vec<Polyline>,
    #[serde(default)]
    pub province: Vec<Polyline>,
    #[serde(default)]
    pub nation: Vec<Polyline>,
    #[serde(default)]
    pub river: Vec<Polyline>,
    /// Closed rings filled with the ocean colour
    #[serde(default)]
    pub ocean: Vec<Polyline>,
}

/// Named boundary layers of a [`Basemap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryLayer {
    Coastline,
    Province,
    Nation,
    River,
}

impl BoundaryLayer {
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryLayer::Coastline => "coastline",
            BoundaryLayer::Province => "province",
            BoundaryLayer::Nation => "nation",
            BoundaryLayer::River => "river",
        }
    }
}

impl Basemap {
    pub fn from_file(path: &Path) -> ChartResult<Self> {
        let bytes = std::fs::read(path)?;
        let basemap: Basemap = serde_json::from_slice(&bytes)?;
        info!(
            path = %path.display(),
            coastline = basemap.coastline.len(),
            province = basemap.province.len(),
            nation = basemap.nation.len(),
            river = basemap.river.len(),
            ocean = basemap.ocean.len(),
            "Loaded basemap"
        );
        Ok(basemap)
    }

    pub fn lines(&self, layer: BoundaryLayer) -> &[Polyline] {
        match layer {
            BoundaryLayer::Coastline => &self.coastline,
            BoundaryLayer::Province => &self.province,
            BoundaryLayer::Nation => &self.nation,
            BoundaryLayer::River => &self.river,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coastline.is_empty()
            && self.province.is_empty()
            && self.nation.is_empty()
            && self.river.is_empty()
            && self.ocean.is_empty()
    }
}

fn default_rank() -> u8 {
    MAJOR_CITY_RANK
}

/// A labelled place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    /// 1 for provincial capitals and larger, higher numbers for smaller places
    #[serde(default = "default_rank")]
    pub rank: u8,
}

/// Load a JSON array of cities.
pub fn load_cities(path: &Path) -> ChartResult<Vec<City>> {
    let bytes = std::fs::read(path)?;
    let cities: Vec<City> = serde_json::from_slice(&bytes)?;
    info!(path = %path.display(), count = cities.len(), "Loaded cities");
    Ok(cities)
}

/// Cities inside `extent`; all ranks when `small_city`, major ones otherwise.
pub fn select_cities(cities: &[City], extent: &MapExtent, small_city: bool) -> Vec<City> {
    cities
        .iter()
        .filter(|c| small_city || c.rank <= MAJOR_CITY_RANK)
        .filter(|c| extent.contains_point(c.lon, c.lat) || extent.contains_point(c.lon + 360.0, c.lat))
        .cloned()
        .collect()
}

/// Decode a PNG/JPEG resource image.
pub fn load_image(path: &Path) -> ChartResult<RgbaImage> {
    let img = image::open(path)
        .map_err(|e| ChartError::Render(format!("cannot load image {}: {}", path.display(), e)))?;
    Ok(img.to_rgba8())
}

/// Where resources are read from. Unset entries are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePaths {
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default)]
    pub basemap: Option<PathBuf>,
    #[serde(default)]
    pub cities: Option<PathBuf>,
    #[serde(default)]
    pub logo: Option<PathBuf>,
    #[serde(default)]
    pub background: Option<PathBuf>,
}

/// Everything a chart draws that does not come from the forecast fields.
#[derive(Debug, Clone, Default)]
pub struct ChartResources {
    pub text: TextRenderer,
    pub basemap: Basemap,
    pub cities: Vec<City>,
    pub logo: Option<RgbaImage>,
    pub background: Option<RgbaImage>,
}

impl ChartResources {
    /// Load every configured resource. A configured path that cannot be
    /// loaded is an error; an unconfigured one is skipped with a warning.
    pub fn load(paths: &ResourcePaths) -> ChartResult<Self> {
        let text = match &paths.font {
            Some(path) => TextRenderer::from_file(path)?,
            None => TextRenderer::from_optional_path(None),
        };

        let basemap = match &paths.basemap {
            Some(path) => Basemap::from_file(path)?,
            None => {
                warn!("No basemap configured, boundaries will be skipped");
                Basemap::default()
            }
        };

        let cities = match &paths.cities {
            Some(path) => load_cities(path)?,
            None => {
                warn!("No city list configured, city labels will be skipped");
                Vec::new()
            }
        };

        let logo = paths.logo.as_deref().map(load_image).transpose()?;
        let background = paths.background.as_deref().map(load_image).transpose()?;

        Ok(Self {
            text,
            basemap,
            cities,
            logo,
            background,
        })
    }
}
