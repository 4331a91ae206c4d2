use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::ColorScheme;
use crate::data::model::GeoPosition;
use crate::map::layer::{ClusterOptions, MarkerStyle, RenderStrategy};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "trendmap.json";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Startup settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Initial map centre as `[lat, lon]`.
    pub center: [f64; 2],
    /// Initial slippy-map zoom level.
    pub zoom: f64,

    pub slider_min: f64,
    pub slider_max: f64,
    pub slider_step: f64,

    pub marker_radius: f32,
    pub stroke_width: f32,
    pub fill_opacity: f32,

    pub color_scheme: ColorScheme,
    pub render_strategy: RenderStrategy,

    /// Grid cells across the viewport when clustering.
    pub cluster_cells: usize,
    /// Zoom level at and above which markers are never clustered.
    pub disable_clustering_at_zoom: f64,

    /// GeoJSON property holding the feature's display name.
    pub name_property: String,
    /// GeoJSON property holding the normalized value.
    pub value_property: String,

    /// Directory for the HTTP cache of map tiles. No cache when unset.
    pub tile_cache: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            center: [47.5, 13.05],
            zoom: 4.0,
            slider_min: -1.0,
            slider_max: 1.0,
            slider_step: 0.01,
            marker_radius: 6.0,
            stroke_width: 1.0,
            fill_opacity: 0.4,
            color_scheme: ColorScheme::Threshold,
            render_strategy: RenderStrategy::Direct,
            cluster_cells: 12,
            disable_clustering_at_zoom: 10.0,
            name_property: "NAME".to_string(),
            value_property: "trendline_slope_minmmax_normalized_data".to_string(),
            tile_cache: None,
        }
    }
}

impl ViewerConfig {
    /// Load from an explicit path, else from [`DEFAULT_CONFIG_FILE`] if it
    /// exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn initial_center(&self) -> GeoPosition {
        GeoPosition::new(self.center[0], self.center[1])
    }

    pub fn marker_style(&self) -> MarkerStyle {
        MarkerStyle {
            radius: self.marker_radius,
            stroke_width: self.stroke_width,
            fill_opacity: self.fill_opacity,
        }
    }

    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            cells_across: self.cluster_cells.max(1),
            disable_at_zoom: self.disable_clustering_at_zoom,
        }
    }

    pub fn property_keys(&self) -> PropertyKeys {
        PropertyKeys {
            name: self.name_property.clone(),
            value: self.value_property.clone(),
        }
    }
}

/// Which GeoJSON properties carry the name and the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeys {
    pub name: String,
    pub value: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        ViewerConfig::default().property_keys()
    }
}
