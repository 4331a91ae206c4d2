use super::model::{FeatureStore, GeoPosition};

// ---------------------------------------------------------------------------
// Viewport predicate: the map's visible bounds
// ---------------------------------------------------------------------------

/// Visible map area in degrees. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl MapBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Whether `position` lies inside, edges included. Non-finite
    /// coordinates are never contained.
    pub fn contains(&self, position: GeoPosition) -> bool {
        position.lat >= self.south
            && position.lat <= self.north
            && position.lon >= self.west
            && position.lon <= self.east
    }

    /// Whether `other` lies entirely inside.
    pub fn covers(&self, other: &MapBounds) -> bool {
        self.contains(GeoPosition::new(other.south, other.west))
            && self.contains(GeoPosition::new(other.north, other.east))
    }

    pub fn center(&self) -> GeoPosition {
        GeoPosition::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Grow each side by `ratio` of the span.
    pub fn pad(&self, ratio: f64) -> Self {
        let dx = self.width() * ratio;
        let dy = self.height() * ratio;
        Self::new(
            (self.south - dy).max(-90.0),
            self.west - dx,
            (self.north + dy).min(90.0),
            self.east + dx,
        )
    }

    /// Equality within `eps` degrees on every edge.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.south - other.south).abs() <= eps
            && (self.west - other.west).abs() <= eps
            && (self.north - other.north).abs() <= eps
            && (self.east - other.east).abs() <= eps
    }
}

// ---------------------------------------------------------------------------
// Range filter: the two slider values
// ---------------------------------------------------------------------------

/// The `[min, max]` slider selection. `min <= max` is not enforced: an
/// inverted range simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterRange {
    pub min: f64,
    pub max: f64,
}

impl Default for FilterRange {
    fn default() -> Self {
        Self { min: -1.0, max: 1.0 }
    }
}

impl FilterRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        in_range(value, self.min, self.max)
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

/// `min <= value <= max`. NaN never passes.
pub fn in_range(value: f64, min: f64, max: f64) -> bool {
    min <= value && value <= max
}

/// Return indices of features that are inside `bounds` and whose value
/// passes `range`, in store order.
pub fn visible_indices(store: &FeatureStore, bounds: &MapBounds, range: &FilterRange) -> Vec<usize> {
    store
        .features
        .iter()
        .enumerate()
        .filter(|(_, f)| range.contains(f.value) && bounds.contains(f.position))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Feature;

    fn store() -> FeatureStore {
        FeatureStore::from_features(vec![
            Feature::new("west", GeoPosition::new(47.0, 10.0), -0.5),
            Feature::new("middle", GeoPosition::new(47.5, 13.0), 0.0),
            Feature::new("east", GeoPosition::new(48.0, 16.0), 0.8),
        ])
    }

    fn everywhere() -> MapBounds {
        MapBounds::new(-85.0, -180.0, 85.0, 180.0)
    }

    #[test]
    fn range_is_inclusive() {
        assert!(in_range(-1.0, -1.0, 1.0));
        assert!(in_range(1.0, -1.0, 1.0));
        assert!(!in_range(1.0001, -1.0, 1.0));
        assert!(!in_range(f64::NAN, -1.0, 1.0));
    }

    #[test]
    fn bounds_edges_are_inclusive() {
        let b = MapBounds::new(47.0, 10.0, 48.0, 16.0);
        assert!(b.contains(GeoPosition::new(47.0, 10.0)));
        assert!(b.contains(GeoPosition::new(48.0, 16.0)));
        assert!(!b.contains(GeoPosition::new(48.01, 12.0)));
        assert!(!b.contains(GeoPosition::new(47.5, 9.99)));
        assert!(!b.contains(GeoPosition::new(f64::NAN, 12.0)));
    }

    #[test]
    fn full_range_keeps_everything() {
        let idx = visible_indices(&store(), &everywhere(), &FilterRange::default());
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn narrowed_range_keeps_positive_only() {
        let idx = visible_indices(&store(), &everywhere(), &FilterRange::new(0.1, 1.0));
        assert_eq!(idx, vec![2]);
    }

    #[test]
    fn inverted_range_is_always_empty() {
        let range = FilterRange::new(0.5, -0.5);
        assert!(range.is_inverted());
        assert!(visible_indices(&store(), &everywhere(), &range).is_empty());
        let degenerate = FilterRange::new(1.0, 0.99);
        assert!(visible_indices(&store(), &everywhere(), &degenerate).is_empty());
    }

    #[test]
    fn viewport_excludes_outside_points() {
        let b = MapBounds::new(46.5, 9.0, 47.8, 14.0);
        let idx = visible_indices(&store(), &b, &FilterRange::default());
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn recompute_is_idempotent() {
        let s = store();
        let b = MapBounds::new(46.5, 9.0, 48.5, 17.0);
        let r = FilterRange::new(-0.6, 0.5);
        assert_eq!(visible_indices(&s, &b, &r), visible_indices(&s, &b, &r));
    }

    #[test]
    fn padding_grows_every_side() {
        let b = MapBounds::new(47.0, 10.0, 48.0, 16.0).pad(0.5);
        assert_eq!(b, MapBounds::new(46.5, 7.0, 48.5, 19.0));
        assert!(b.covers(&MapBounds::new(47.0, 10.0, 48.0, 16.0)));
        assert!(!MapBounds::new(47.0, 10.0, 48.0, 16.0).covers(&b));
        let c = b.center();
        assert!((c.lat - 47.5).abs() < 1e-12 && (c.lon - 13.0).abs() < 1e-12);
    }
}
