use eframe::egui::{Pos2, Rect, Vec2, vec2};
use walkers::{MapMemory, Position, Projector, lat_lon};

use crate::data::filter::MapBounds;
use crate::data::model::GeoPosition;

/// Map size assumed before the widget has been laid out.
pub const NOMINAL_VIEWPORT: Vec2 = vec2(1024.0, 640.0);

/// Deepest zoom "zoom to data" will pick; OpenStreetMap serves up to 19.
pub const MAX_FIT_ZOOM: f64 = 18.0;

const FIT_ZOOM_STEP: f64 = 0.25;

pub fn to_position(p: GeoPosition) -> Position {
    lat_lon(p.lat, p.lon)
}

pub fn from_position(p: Position) -> GeoPosition {
    GeoPosition::new(p.y(), p.x())
}

/// Map memory centred on `center` at `zoom`. An out-of-range zoom keeps the
/// widget's default.
pub fn initial_memory(center: GeoPosition, zoom: f64) -> MapMemory {
    let mut memory = MapMemory::default();
    memory.center_at(to_position(center));
    if memory.set_zoom(zoom).is_err() {
        log::warn!("Zoom {zoom} out of range, using {}", memory.zoom());
    }
    memory
}

/// Geographic bounds of the screen area `rect`.
pub fn visible_bounds(projector: &Projector, rect: Rect) -> MapBounds {
    let north_west = projector.unproject(rect.left_top() - rect.center());
    let south_east = projector.unproject(rect.right_bottom() - rect.center());
    MapBounds::new(south_east.y(), north_west.x(), north_west.y(), south_east.x())
}

/// Bounds a map of `size` would show with the given memory.
pub fn bounds_for(memory: &MapMemory, home: GeoPosition, size: Vec2) -> MapBounds {
    let rect = Rect::from_center_size(Pos2::ZERO, size);
    visible_bounds(&Projector::new(rect, memory, to_position(home)), rect)
}

/// Centre on `target` and pick the deepest zoom at which it fits a map of
/// `size`.
pub fn fit(memory: &mut MapMemory, target: &MapBounds, size: Vec2) {
    let center = target.center();
    memory.center_at(to_position(center));

    let mut zoom = MAX_FIT_ZOOM;
    while zoom > 0.0 {
        if memory.set_zoom(zoom).is_err() {
            break;
        }
        if bounds_for(memory, center, size).covers(target) {
            return;
        }
        zoom -= FIT_ZOOM_STEP;
    }
    if memory.set_zoom(0.0).is_err() {
        log::warn!("Cannot reset map zoom");
    }
}

/// Length of a round-numbered scale bar (1, 2 or 5 × 10ⁿ metres) no longer
/// than `max_px`, and its width in pixels.
pub fn scale_bar(pixels_per_meter: f64, max_px: f64) -> Option<(f64, f64)> {
    if !(pixels_per_meter.is_finite() && pixels_per_meter > 0.0) {
        return None;
    }
    let max_meters = max_px / pixels_per_meter;
    let magnitude = 10f64.powf(max_meters.log10().floor());
    let meters = [5.0, 2.0, 1.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|&m| m <= max_meters)?;
    Some((meters, meters * pixels_per_meter))
}

/// `"500 m"`, `"20 km"`.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{} km", meters / 1000.0)
    } else {
        format!("{meters} m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_world_at_zoom_zero() {
        let mut memory = MapMemory::default();
        memory.center_at(lat_lon(0.0, 0.0));
        memory.set_zoom(0.0).unwrap();
        let b = bounds_for(&memory, GeoPosition::new(0.0, 0.0), vec2(256.0, 256.0));
        assert!((b.west + 180.0).abs() < 1e-6, "{b:?}");
        assert!((b.east - 180.0).abs() < 1e-6, "{b:?}");
        assert!((b.north - 85.0511).abs() < 1e-3, "{b:?}");
        assert!((b.south + 85.0511).abs() < 1e-3, "{b:?}");
    }

    #[test]
    fn initial_bounds_surround_center() {
        let center = GeoPosition::new(47.5, 13.05);
        let memory = initial_memory(center, 4.0);
        assert_eq!(memory.zoom(), 4.0);
        let b = bounds_for(&memory, center, NOMINAL_VIEWPORT);
        assert!(b.contains(center));
        // 1024 px at zoom 4 is a quarter of the 4096 px world.
        assert!((b.width() - 90.0).abs() < 1e-6, "{b:?}");
        assert!(b.south < 47.5 && b.north > 47.5);
    }

    #[test]
    fn bad_zoom_keeps_default() {
        let memory = initial_memory(GeoPosition::new(0.0, 0.0), 40.0);
        assert_eq!(memory.zoom(), MapMemory::default().zoom());
    }

    #[test]
    fn fit_picks_deepest_covering_zoom() {
        let alps = MapBounds::new(45.0, 9.0, 49.0, 17.0);
        let mut memory = MapMemory::default();
        fit(&mut memory, &alps, NOMINAL_VIEWPORT);

        let zoom = memory.zoom();
        assert!(zoom > 6.5 && zoom < 7.5, "zoom {zoom}");
        let home = alps.center();
        assert!(bounds_for(&memory, home, NOMINAL_VIEWPORT).covers(&alps));

        memory.set_zoom(zoom + FIT_ZOOM_STEP).unwrap();
        assert!(!bounds_for(&memory, home, NOMINAL_VIEWPORT).covers(&alps));
    }

    #[test]
    fn position_conversion_keeps_lat_lon_order() {
        let p = GeoPosition::new(47.5, 13.05);
        let w = to_position(p);
        assert_eq!(w.x(), 13.05);
        assert_eq!(w.y(), 47.5);
        assert_eq!(from_position(w), p);
    }

    #[test]
    fn scale_bar_rounds_down_to_1_2_5() {
        // 0.01 px/m: 100 px is 10 km.
        let (m, px) = scale_bar(0.01, 100.0).unwrap();
        assert!((m - 10_000.0).abs() < 1e-6 && (px - 100.0).abs() < 1e-6);
        // 0.004 px/m: 100 px is 25 km, so 20 km at 80 px.
        let (m, px) = scale_bar(0.004, 100.0).unwrap();
        assert!((m - 20_000.0).abs() < 1e-6);
        assert!((px - 80.0).abs() < 1e-9);
        assert_eq!(scale_bar(0.0, 100.0), None);
        assert_eq!(format_distance(20_000.0), "20 km");
        assert_eq!(format_distance(500.0), "500 m");
    }
}
