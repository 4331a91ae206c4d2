use std::path::Path;

use walkers::MapMemory;

use crate::chart::ScatterProjector;
use crate::color::ColorScheme;
use crate::config::ViewerConfig;
use crate::data::filter::{FilterRange, MapBounds};
use crate::data::loader;
use crate::data::model::{FeatureStore, GeoPosition};
use crate::map::layer::{LayerSynchronizer, RedrawError, RenderStrategy, ViewParams, VisibleSet};
use crate::map::viewport;

// ---------------------------------------------------------------------------
// Events and redraw phases
// ---------------------------------------------------------------------------

/// Inputs that trigger a redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    InitialLoad,
    MinSlider(f64),
    MaxSlider(f64),
    /// The map stopped moving with `bounds` visible at `zoom`.
    MoveEnd { bounds: MapBounds, zoom: f64 },
    SchemeChanged(ColorScheme),
    StrategyChanged(RenderStrategy),
}

/// The synchronizer/projector pair is either idle or inside one redraw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedrawPhase {
    #[default]
    Idle,
    Redrawing,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Loaded dataset (None until user loads a file).
    pub store: Option<FeatureStore>,

    /// Current slider selection.
    pub filter: FilterRange,

    /// Current map viewport and its zoom level.
    pub bounds: MapBounds,
    pub zoom: f64,

    /// Pan/zoom state of the map widget.
    pub map_memory: MapMemory,

    /// Where the map is centred until the user moves it.
    pub home: GeoPosition,

    pub scheme: ColorScheme,
    pub strategy: RenderStrategy,

    pub phase: RedrawPhase,

    /// Map markers, rebuilt by every redraw.
    pub synchronizer: LayerSynchronizer,

    /// Scatter chart, rebuilt by every redraw.
    pub projector: ScatterProjector,

    /// Id of the chart the scatter plot last drew.
    pub plotted_chart: Option<u64>,

    /// Features that passed the last successful redraw.
    pub visible: VisibleSet,

    /// Viewport the map widget should jump to on its next frame.
    pub pending_view: Option<MapBounds>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Completed redraw passes, successful or not.
    pub redraw_count: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let home = config.initial_center();
        let map_memory = viewport::initial_memory(home, config.zoom);
        let bounds = viewport::bounds_for(&map_memory, home, viewport::NOMINAL_VIEWPORT);
        Self {
            filter: FilterRange::new(config.slider_min, config.slider_max),
            scheme: config.color_scheme,
            strategy: config.render_strategy,
            synchronizer: LayerSynchronizer::new(config.marker_style()),
            projector: ScatterProjector::new(),
            plotted_chart: None,
            store: None,
            bounds,
            zoom: map_memory.zoom(),
            map_memory,
            home,
            phase: RedrawPhase::Idle,
            visible: VisibleSet::default(),
            pending_view: None,
            status_message: None,
            redraw_count: 0,
            config,
        }
    }

    /// Load a dataset file and run the initial redraw.
    pub fn open_path(&mut self, path: &Path) {
        match loader::load_file(path, &self.config.property_keys()) {
            Ok(store) => self.set_dataset(store),
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and redraw.
    pub fn set_dataset(&mut self, store: FeatureStore) {
        self.store = Some(store);
        self.handle(AppEvent::InitialLoad);
    }

    /// Dispatch without surfacing the error; it is already in the log and
    /// the status line.
    pub fn handle(&mut self, event: AppEvent) {
        let _ = self.dispatch(event);
    }

    /// Apply `event` to the state, then run one full redraw.
    pub fn dispatch(&mut self, event: AppEvent) -> Result<(), RedrawError> {
        match event {
            AppEvent::InitialLoad => {}
            AppEvent::MinSlider(v) => self.filter.min = v,
            AppEvent::MaxSlider(v) => self.filter.max = v,
            AppEvent::MoveEnd { bounds, zoom } => {
                self.bounds = bounds;
                self.zoom = zoom;
            }
            AppEvent::SchemeChanged(scheme) => self.scheme = scheme,
            AppEvent::StrategyChanged(strategy) => self.strategy = strategy,
        }
        self.redraw()
    }

    /// Idle → Redrawing → Idle. Rebuilds the marker layer, then the chart
    /// from the same visible values. On failure both are left empty.
    fn redraw(&mut self) -> Result<(), RedrawError> {
        debug_assert_eq!(self.phase, RedrawPhase::Idle);
        self.phase = RedrawPhase::Redrawing;

        let view = ViewParams {
            bounds: self.bounds,
            zoom: self.zoom,
            range: self.filter,
            scheme: self.scheme,
            strategy: self.strategy,
            clusters: self.config.cluster_options(),
        };

        let result = self.synchronizer.synchronize(self.store.as_ref(), &view);
        let outcome = match result {
            Ok(visible) => {
                self.projector.project(&visible.values, self.scheme);
                log::trace!("{} chart instance(s) alive", self.projector.live_instances());
                self.visible = visible;
                self.status_message = None;
                Ok(())
            }
            Err(e) => {
                log::error!("Redraw aborted: {e}");
                self.projector.discard();
                self.visible = VisibleSet::default();
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        };

        self.redraw_count += 1;
        self.phase = RedrawPhase::Idle;
        outcome
    }

    /// Ask the map to show the whole dataset. The resulting move-end
    /// triggers the redraw.
    pub fn zoom_to_data(&mut self) {
        if let Some(extent) = self.store.as_ref().and_then(FeatureStore::extent) {
            self.pending_view = Some(extent.pad(0.05));
        }
    }
}
