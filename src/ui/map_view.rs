use eframe::egui::{self, Align2, Color32, FontId, Pos2, Response, Shape, Stroke, Ui, Vec2, vec2};
use walkers::{Map, Plugin, Projector, Tiles};

use crate::color::ColorScheme;
use crate::data::model::{GeoPosition, LineFeature};
use crate::map::layer::{MarkerLayer, MarkerStyle};
use crate::map::viewport;
use crate::state::{AppEvent, AppState};

/// Line overlays keep the fixed style of the source layer.
const LINE_COLOR: Color32 = Color32::RED;
const LINE_WIDTH: f32 = 5.0;

/// Hover pick radius around a marker, in screen points.
const PICK_RADIUS: f32 = 8.0;

/// Viewport changes smaller than this (degrees) are not a move.
const MOVE_EPSILON: f64 = 1e-9;

const SCALE_BAR_MAX_PX: f64 = 120.0;

// ---------------------------------------------------------------------------
// Map canvas (central panel)
// ---------------------------------------------------------------------------

/// Render the tile map with line overlays, then markers or clusters on top.
/// Dispatches a move-end once the viewport settles somewhere new.
pub fn map_view(ui: &mut Ui, state: &mut AppState, tiles: &mut dyn Tiles) {
    if let Some(target) = state.pending_view.take() {
        viewport::fit(&mut state.map_memory, &target, ui.available_size());
    }

    let attribution = tiles.attribution();
    let home = viewport::to_position(state.home);
    let overlay = FeatureOverlay {
        layer: state.synchronizer.layer(),
        lines: state.store.as_ref().map(|s| s.lines.as_slice()).unwrap_or(&[]),
        scheme: state.scheme,
    };
    let mut response = ui.add(
        Map::new(Some(tiles), &mut state.map_memory, home)
            .with_plugin(overlay)
            .double_click_to_zoom(true),
    );

    let projector = Projector::new(response.rect, &state.map_memory, home);

    // Popup label under the pointer.
    if let Some(pointer) = response.hover_pos() {
        let layer = state.synchronizer.layer();
        let distance = |p: GeoPosition| screen(&projector, p).distance(pointer);
        let radius = layer.style.radius.max(PICK_RADIUS);
        if let Some(label) = layer.label_near(state.scheme, distance, radius) {
            response = response.on_hover_text_at_pointer(label);
        }
    }

    zoom_buttons(ui, state, &response);

    // Scale bar bottom-left, tile attribution bottom-right.
    let center = state
        .map_memory
        .detached()
        .map(viewport::from_position)
        .unwrap_or(state.home);
    let pixels_per_meter = projector.scale_pixel_per_meter(viewport::to_position(center));
    let painter = ui.painter_at(response.rect);
    let text_color = Color32::from_gray(40);
    if let Some((meters, px)) = viewport::scale_bar(f64::from(pixels_per_meter), SCALE_BAR_MAX_PX) {
        let start = response.rect.left_bottom() + vec2(12.0, -14.0);
        let end = start + vec2(px as f32, 0.0);
        let stroke = Stroke::new(2.0, text_color);
        painter.line_segment([start, end], stroke);
        painter.line_segment([start, start - vec2(0.0, 5.0)], stroke);
        painter.line_segment([end, end - vec2(0.0, 5.0)], stroke);
        painter.text(
            start - vec2(0.0, 7.0),
            Align2::LEFT_BOTTOM,
            format!(
                "{}  ·  zoom {:.1}",
                viewport::format_distance(meters),
                state.map_memory.zoom()
            ),
            FontId::proportional(12.0),
            text_color,
        );
    }
    painter.text(
        response.rect.right_bottom() + vec2(-8.0, -6.0),
        Align2::RIGHT_BOTTOM,
        format!("© {}", attribution.text),
        FontId::proportional(11.0),
        text_color,
    );

    // Move-end: nothing held, no wheel or pinch in flight, no inertia left.
    let bounds = viewport::visible_bounds(&projector, response.rect);
    let zoom = state.map_memory.zoom();
    let settled = !ui.input(gesture_in_flight) && !response.changed() && !response.dragged();
    let moved = !bounds.approx_eq(&state.bounds, MOVE_EPSILON) || zoom != state.zoom;
    if settled && moved && bounds.width() > 0.0 {
        if state.store.is_some() {
            log::debug!("Map moved to {bounds:?} at zoom {zoom:.2}");
            state.handle(AppEvent::MoveEnd { bounds, zoom });
        } else {
            // Nothing to redraw yet; remember where the user is looking.
            state.bounds = bounds;
            state.zoom = zoom;
        }
    }
}

/// Pointer held, wheel scroll still being smoothed, or a pinch zoom.
fn gesture_in_flight(input: &egui::InputState) -> bool {
    input.pointer.any_down() || input.smooth_scroll_delta != Vec2::ZERO || input.zoom_delta() != 1.0
}

fn zoom_buttons(ui: &Ui, state: &mut AppState, map: &Response) {
    egui::Area::new(egui::Id::new("map_zoom_buttons"))
        .fixed_pos(map.rect.left_top() + vec2(10.0, 10.0))
        .show(ui.ctx(), |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.button(" + ").clicked() && state.map_memory.zoom_in().is_err() {
                    log::debug!("Already at maximum zoom");
                }
                if ui.button(" − ").clicked() && state.map_memory.zoom_out().is_err() {
                    log::debug!("Already at minimum zoom");
                }
            });
        });
}

fn screen(projector: &Projector, p: GeoPosition) -> Pos2 {
    projector.project(viewport::to_position(p)).to_pos2()
}

// ---------------------------------------------------------------------------
// Overlay plugin: lines, markers, clusters
// ---------------------------------------------------------------------------

struct FeatureOverlay<'a> {
    layer: &'a MarkerLayer,
    lines: &'a [LineFeature],
    scheme: ColorScheme,
}

impl Plugin for FeatureOverlay<'_> {
    fn run(self: Box<Self>, ui: &mut Ui, response: &Response, projector: &Projector) {
        let painter = ui.painter_at(response.rect);

        for line in self.lines {
            let points: Vec<Pos2> = line.path.iter().map(|p| screen(projector, *p)).collect();
            painter.add(Shape::line(points, Stroke::new(LINE_WIDTH, LINE_COLOR)));
        }

        let layer = self.layer;
        if !layer.is_clustered() {
            for m in &layer.markers {
                let fill = m.fill.with_opacity(layer.style.fill_opacity);
                draw_marker(&painter, screen(projector, m.position), fill, layer.style);
            }
            return;
        }

        for cluster in &layer.clusters {
            if cluster.is_single() {
                let m = &layer.markers[cluster.members[0]];
                let fill = m.fill.with_opacity(layer.style.fill_opacity);
                draw_marker(&painter, screen(projector, m.position), fill, layer.style);
                continue;
            }
            // Badge grows with the member count.
            let center = screen(projector, cluster.center);
            let style = MarkerStyle {
                radius: layer.style.radius + 4.0 + 2.0 * (cluster.len() as f32).log2(),
                ..layer.style
            };
            let fill = self.scheme.color(cluster.mean_value).with_opacity(0.6);
            draw_marker(&painter, center, fill, style);
            painter.text(
                center,
                Align2::CENTER_CENTER,
                cluster.len().to_string(),
                FontId::proportional(12.0),
                Color32::BLACK,
            );
        }
    }
}

/// Filled circle with a black outline.
fn draw_marker(painter: &egui::Painter, center: Pos2, fill: Color32, style: MarkerStyle) {
    painter.circle(
        center,
        style.radius,
        fill,
        Stroke::new(style.stroke_width, Color32::BLACK),
    );
}
