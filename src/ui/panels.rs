use eframe::egui::{self, Color32, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{self, ColorScheme};
use crate::map::layer::RenderStrategy;
use crate::state::{AppEvent, AppState};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter");
    ui.separator();

    // ---- Range sliders ----
    let range = state.config.slider_min..=state.config.slider_max;
    let step = state.config.slider_step;

    let mut min = state.filter.min;
    if ui
        .add(egui::Slider::new(&mut min, range.clone()).step_by(step).text("min"))
        .changed()
    {
        state.handle(AppEvent::MinSlider(min));
    }
    ui.label(format!("Min: {}", state.filter.min));

    let mut max = state.filter.max;
    if ui
        .add(egui::Slider::new(&mut max, range).step_by(step).text("max"))
        .changed()
    {
        state.handle(AppEvent::MaxSlider(max));
    }
    ui.label(format!("Max: {}", state.filter.max));

    if let Some((lo, hi)) = state.store.as_ref().and_then(|s| s.value_range()) {
        ui.label(RichText::new(format!("Data range: {lo:.3} … {hi:.3}")).weak());
    }
    if state.filter.is_inverted() {
        ui.label(RichText::new("min > max: nothing matches").italics().weak());
    }
    ui.separator();

    // ---- Colour / render selectors ----
    ui.strong("Color by value");
    let current_scheme = state.scheme;
    egui::ComboBox::from_id_salt("color_scheme")
        .selected_text(current_scheme.label())
        .show_ui(ui, |ui: &mut Ui| {
            for scheme in ColorScheme::ALL {
                if ui
                    .selectable_label(current_scheme == scheme, scheme.label())
                    .clicked()
                    && scheme != current_scheme
                {
                    state.handle(AppEvent::SchemeChanged(scheme));
                }
            }
        });

    ui.add_space(4.0);
    ui.strong("Render as");
    let current_strategy = state.strategy;
    ui.horizontal(|ui: &mut Ui| {
        for strategy in RenderStrategy::ALL {
            if ui
                .radio(current_strategy == strategy, strategy.label())
                .clicked()
                && strategy != current_strategy
            {
                state.handle(AppEvent::StrategyChanged(strategy));
            }
        }
    });
    ui.separator();

    // ---- Legend ----
    legend(ui, state.scheme);
    ui.separator();

    // ---- Visible features ----
    if state.store.is_none() {
        ui.label("No dataset loaded.");
        return;
    }
    egui::CollapsingHeader::new(
        RichText::new(format!("Visible features  ({})", state.visible.len())).strong(),
    )
    .id_salt("visible_table")
    .default_open(false)
    .show(ui, |ui: &mut Ui| visible_table(ui, state));

    overlay_list(ui, state);
}

/// Names of the line overlays drawn on the map.
fn overlay_list(ui: &mut Ui, state: &AppState) {
    let Some(store) = &state.store else {
        return;
    };
    if store.lines.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(
        RichText::new(format!("Line overlays  ({})", store.lines.len())).strong(),
    )
    .id_salt("line_overlays")
    .default_open(false)
    .show(ui, |ui: &mut Ui| {
        for (i, line) in store.lines.iter().enumerate() {
            ui.label(format!("{}  ({} points)", line.title(i), line.path.len()));
        }
    });
}

/// Colour bar for the active scheme with tick labels underneath.
fn legend(ui: &mut Ui, scheme: ColorScheme) {
    ui.strong("Legend");

    let width = ui.available_width().min(220.0);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, 14.0), Sense::hover());
    let stops = color::legend_stops(scheme, 64);
    let step = rect.width() / stops.len() as f32;
    let painter = ui.painter();
    for (i, (_, c)) in stops.iter().enumerate() {
        let x0 = rect.left() + i as f32 * step;
        let cell = egui::Rect::from_min_max(
            egui::pos2(x0, rect.top()),
            egui::pos2(x0 + step + 0.5, rect.bottom()),
        );
        painter.rect_filled(cell, 0.0, *c);
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        let slot = width / color::LEGEND_TICKS.len() as f32;
        for tick in color::LEGEND_TICKS {
            ui.add_sized([slot, 14.0], egui::Label::new(RichText::new(tick.to_string()).small()));
        }
    });
}

fn visible_table(ui: &mut Ui, state: &AppState) {
    let Some(store) = &state.store else {
        return;
    };
    let indices = &state.visible.indices;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(260.0)
        .column(Column::remainder().at_least(80.0))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .header(18.0, |mut header| {
            for title in ["Name", "Value", "Lat", "Lon"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, indices.len(), |mut row| {
                let feature = &store.features[indices[row.index()]];
                let fill = state.scheme.color(feature.value).to_color32();
                row.col(|ui: &mut Ui| {
                    ui.label(&feature.name);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(RichText::new(format!("{:.3}", feature.value)).color(fill));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.4}", feature.position.lat));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.4}", feature.position.lon));
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(store) = &state.store {
            ui.label(format!(
                "{} features loaded, {} visible",
                store.len(),
                state.visible.len()
            ));
            ui.separator();
            if ui.button("Zoom to data").clicked() {
                state.zoom_to_data();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open feature dataset")
        .add_filter("Supported files", &["geojson", "json", "js", "csv", "parquet", "pq"])
        .add_filter("GeoJSON", &["geojson", "json"])
        .add_filter("GeoJSON script", &["js"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
