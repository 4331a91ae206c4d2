use serde::Deserialize;
use thiserror::Error;

use super::cluster::{Cluster, grid_cluster};
use crate::color::{ColorScheme, Rgb};
use crate::data::filter::{FilterRange, MapBounds, visible_indices};
use crate::data::model::{FeatureStore, GeoPosition};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a redraw pass was abandoned. Neither is fatal to the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RedrawError {
    #[error("no features loaded")]
    MissingDataset,
    #[error("cannot build marker for feature #{index} '{name}': {reason}")]
    LayerConstruction {
        index: usize,
        name: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Marker layer
// ---------------------------------------------------------------------------

/// Direct markers or grid clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    #[default]
    Direct,
    Clustered,
}

impl RenderStrategy {
    pub const ALL: [RenderStrategy; 2] = [RenderStrategy::Direct, RenderStrategy::Clustered];

    pub fn label(self) -> &'static str {
        match self {
            RenderStrategy::Direct => "Markers",
            RenderStrategy::Clustered => "Clusters",
        }
    }
}

/// Fixed circle-marker styling. Stroke colour is always black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f32,
    pub stroke_width: f32,
    pub fill_opacity: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 6.0,
            stroke_width: 1.0,
            fill_opacity: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    pub cells_across: usize,
    pub disable_at_zoom: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            cells_across: 12,
            disable_at_zoom: 10.0,
        }
    }
}

/// One styled point on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Index of the source feature in the store.
    pub feature: usize,
    pub position: GeoPosition,
    pub value: f64,
    pub fill: Rgb,
    pub label: String,
}

/// What the map currently displays. Replaced wholesale on every redraw.
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    pub markers: Vec<Marker>,
    /// Filled only when clustering is active for this pass.
    pub clusters: Vec<Cluster>,
    pub style: MarkerStyle,
}

impl MarkerLayer {
    pub fn clear(&mut self) {
        self.markers.clear();
        self.clusters.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn is_clustered(&self) -> bool {
        !self.clusters.is_empty()
    }

    /// Popup label of the marker or cluster with the smallest `distance`,
    /// if it is within `max_distance`.
    pub fn label_near(
        &self,
        scheme: ColorScheme,
        mut distance: impl FnMut(GeoPosition) -> f32,
        max_distance: f32,
    ) -> Option<String> {
        if self.is_clustered() {
            self.clusters
                .iter()
                .map(|c| (distance(c.center), c))
                .filter(|(d, _)| *d <= max_distance)
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, c)| {
                    if c.is_single() {
                        self.markers[c.members[0]].label.clone()
                    } else {
                        c.label(scheme)
                    }
                })
        } else {
            self.markers
                .iter()
                .map(|m| (distance(m.position), m))
                .filter(|(d, _)| *d <= max_distance)
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, m)| m.label.clone())
        }
    }
}

/// Everything a redraw pass reads besides the store.
#[derive(Debug, Clone, Copy)]
pub struct ViewParams {
    pub bounds: MapBounds,
    /// Slippy-map zoom level the bounds were taken at.
    pub zoom: f64,
    pub range: FilterRange,
    pub scheme: ColorScheme,
    pub strategy: RenderStrategy,
    pub clusters: ClusterOptions,
}

/// The features that passed one redraw, in store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl VisibleSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Layer synchronizer
// ---------------------------------------------------------------------------

/// Owns the marker layer and rebuilds it from scratch on every trigger.
#[derive(Debug, Default)]
pub struct LayerSynchronizer {
    layer: MarkerLayer,
}

impl LayerSynchronizer {
    pub fn new(style: MarkerStyle) -> Self {
        Self {
            layer: MarkerLayer {
                style,
                ..Default::default()
            },
        }
    }

    pub fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    /// Clear the layer, then add one marker per feature that is inside the
    /// viewport and within the value range.
    ///
    /// A feature with a non-finite coordinate aborts the pass and leaves the
    /// layer empty.
    pub fn synchronize(
        &mut self,
        store: Option<&FeatureStore>,
        view: &ViewParams,
    ) -> Result<VisibleSet, RedrawError> {
        self.layer.clear();

        let store = match store {
            Some(s) if !s.is_empty() => s,
            _ => return Err(RedrawError::MissingDataset),
        };

        if let Some((index, feature)) = store
            .features
            .iter()
            .enumerate()
            .find(|(_, f)| !f.position.is_finite())
        {
            return Err(RedrawError::LayerConstruction {
                index,
                name: feature.name.clone(),
                reason: format!("non-finite position {}", feature.position),
            });
        }

        let indices = visible_indices(store, &view.bounds, &view.range);
        let markers: Vec<Marker> = indices
            .iter()
            .map(|&i| {
                let feature = &store.features[i];
                Marker {
                    feature: i,
                    position: feature.position,
                    value: feature.value,
                    fill: view.scheme.color(feature.value),
                    label: feature.label(),
                }
            })
            .collect();
        let visible = VisibleSet {
            values: markers.iter().map(|m| m.value).collect(),
            indices,
        };

        let cluster = view.strategy == RenderStrategy::Clustered
            && view.zoom < view.clusters.disable_at_zoom;
        if cluster {
            self.layer.clusters = grid_cluster(&markers, &view.bounds, view.clusters.cells_across);
        }
        self.layer.markers = markers;

        log::debug!(
            "Layer rebuilt: {} of {} features visible{}",
            visible.len(),
            store.len(),
            if cluster {
                format!(" in {} clusters", self.layer.clusters.len())
            } else {
                String::new()
            }
        );

        Ok(visible)
    }
}
