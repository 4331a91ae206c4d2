use eframe::egui;
use walkers::{HttpOptions, HttpTiles, sources::OpenStreetMap};

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::{map_view, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TrendMapApp {
    pub state: AppState,
    /// OpenStreetMap base layer. Downloads run on walkers' own IO thread.
    tiles: HttpTiles,
}

impl TrendMapApp {
    pub fn new(egui_ctx: egui::Context, config: ViewerConfig) -> Self {
        let options = HttpOptions {
            cache: config.tile_cache.clone(),
            ..Default::default()
        };
        Self {
            tiles: HttpTiles::with_options(OpenStreetMap, options, egui_ctx),
            state: AppState::new(config),
        }
    }
}

impl eframe::App for TrendMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: sliders, legend ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: scatter chart ----
        egui::TopBottomPanel::bottom("chart_panel")
            .default_height(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::scatter_plot(ui, &mut self.state);
            });

        // ---- Central panel: map ----
        let rimless = egui::Frame {
            fill: ctx.style().visuals.panel_fill,
            ..Default::default()
        };
        egui::CentralPanel::default().frame(rimless).show(ctx, |ui| {
            map_view::map_view(ui, &mut self.state, &mut self.tiles);
        });
    }
}
