use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{MarkerShape, Plot, PlotPoints, Points};

use crate::color::Rgb;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Scatter chart (bottom panel)
// ---------------------------------------------------------------------------

/// Render the index/value scatter chart of the visible features.
pub fn scatter_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(chart) = state.projector.chart() else {
        state.plotted_chart = None;
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No chart: open a dataset  (File → Open…)");
        });
        return;
    };

    // One series per colour; egui_plot colours whole series.
    let mut by_color: BTreeMap<Rgb, Vec<[f64; 2]>> = BTreeMap::new();
    for p in &chart.points {
        by_color.entry(p.color).or_default().push([p.x, p.y]);
    }
    let outlines: Vec<[f64; 2]> = chart.points.iter().map(|p| [p.x, p.y]).collect();

    let (y_min, y_max) = chart.y_extent();

    let mut plot = Plot::new("scatter_plot");
    if state.plotted_chart != Some(chart.id()) {
        // New chart: drop the previous chart's pan/zoom.
        plot = plot.reset();
    }

    plot.x_axis_label("Index")
        .y_axis_label(chart.title)
        .include_y(y_min)
        .include_y(y_max)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (color, points) in by_color {
                plot_ui.points(
                    Points::new(PlotPoints::new(points))
                        .name(chart.title)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(3.5)
                        .color(color.to_color32()),
                );
            }
            plot_ui.points(
                Points::new(PlotPoints::new(outlines))
                    .shape(MarkerShape::Circle)
                    .filled(false)
                    .radius(3.5)
                    .color(Color32::BLACK),
            );
        });

    state.plotted_chart = Some(chart.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::MapBounds;
    use crate::data::model::{Feature, FeatureStore, GeoPosition};
    use crate::state::AppEvent;
    use eframe::egui;
    use egui_plot::PlotMemory;

    fn frame(ctx: &egui::Context, state: &mut AppState) {
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| scatter_plot(ui, state));
        });
    }

    #[test]
    fn redraws_reuse_one_plot_memory() {
        let mut state = AppState::default();
        state.bounds = MapBounds::new(-80.0, -180.0, 80.0, 180.0);
        state.set_dataset(FeatureStore::from_features(
            (0..20)
                .map(|i| {
                    let v = -1.0 + i as f64 * 0.1;
                    Feature::new(format!("f{i}"), GeoPosition::new(47.0, 10.0 + i as f64 * 0.1), v)
                })
                .collect(),
        ));

        let ctx = egui::Context::default();
        let mut plot_memories = Vec::new();
        let mut data_entries = Vec::new();
        for i in 0..200 {
            state.handle(AppEvent::MinSlider(-1.0 + i as f64 * 0.005));
            frame(&ctx, &mut state);
            plot_memories.push(ctx.memory(|m| m.data.count::<PlotMemory>()));
            data_entries.push(ctx.memory(|m| m.data.len()));
        }

        assert_eq!(state.projector.live_instances(), 1);
        assert!(plot_memories.iter().all(|&n| n == 1), "{plot_memories:?}");
        assert_eq!(data_entries[10], data_entries[199], "{data_entries:?}");
        assert_eq!(state.plotted_chart, state.projector.chart().map(|c| c.id()));
    }

    #[test]
    fn no_chart_clears_plotted_id() {
        let mut state = AppState::default();
        state.plotted_chart = Some(3);
        let ctx = egui::Context::default();
        frame(&ctx, &mut state);
        assert_eq!(state.plotted_chart, None);
    }
}
