mod app;
mod chart;
mod color;
mod config;
mod data;
mod map;
mod state;
mod ui;

use std::path::PathBuf;

use app::TrendMapApp;
use clap::Parser;
use config::ViewerConfig;
use eframe::egui;

/// Interactive map of a normalized trend attribute with range filtering.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Dataset to open at startup (.geojson, .json, .js, .csv, .parquet)
    dataset: Option<PathBuf>,

    /// JSON configuration file (defaults to ./trendmap.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = CliArgs::parse();

    let config = ViewerConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        log::error!("{e:#}; using default configuration");
        ViewerConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Trend Map",
        options,
        Box::new(move |cc| {
            let mut app = TrendMapApp::new(cc.egui_ctx.clone(), config);
            if let Some(path) = &args.dataset {
                app.state.open_path(path);
            }
            Ok(Box::new(app))
        }),
    )
}
