use std::fmt;

use super::filter::MapBounds;

// ---------------------------------------------------------------------------
// GeoPosition – a WGS-84 coordinate
// ---------------------------------------------------------------------------

/// Latitude / longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPosition {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// GeoJSON orders coordinates `[lon, lat, (alt)]`.
    pub fn from_lon_lat(coords: &[f64]) -> Option<Self> {
        match coords {
            [lon, lat, ..] => Some(Self::new(*lat, *lon)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Feature – one filterable record of the dataset
// ---------------------------------------------------------------------------

/// A single point feature with its normalized trend value.
///
/// `value` is expected in `[-1, 1]` but nothing enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub position: GeoPosition,
    pub name: String,
    pub value: f64,
}

impl Feature {
    pub fn new(name: impl Into<String>, position: GeoPosition, value: f64) -> Self {
        Self {
            position,
            name: name.into(),
            value,
        }
    }

    /// Popup text bound to the feature's marker.
    pub fn label(&self) -> String {
        format!("Name: {}\nValue: {}", self.name, self.value)
    }
}

/// A polyline overlay (rivers, borders, tracks). Not filterable.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub name: Option<String>,
    pub path: Vec<GeoPosition>,
}

impl LineFeature {
    /// Display name; unnamed lines are numbered from 1 by `index`.
    pub fn title(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Line {}", index + 1))
    }
}

// ---------------------------------------------------------------------------
// FeatureStore – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Everything parsed from one dataset file. Immutable after loading.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    /// Filterable point features, in file order.
    pub features: Vec<Feature>,
    /// Line overlays, drawn as-is.
    pub lines: Vec<LineFeature>,
}

impl FeatureStore {
    pub fn new(features: Vec<Feature>, lines: Vec<LineFeature>) -> Self {
        Self { features, lines }
    }

    pub fn from_features(features: Vec<Feature>) -> Self {
        Self::new(features, Vec::new())
    }

    /// Number of point features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether there is nothing to filter.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Smallest bounds enclosing every finite point and line vertex.
    pub fn extent(&self) -> Option<MapBounds> {
        let positions = self
            .features
            .iter()
            .map(|f| f.position)
            .chain(self.lines.iter().flat_map(|l| l.path.iter().copied()))
            .filter(GeoPosition::is_finite);

        positions.fold(None, |acc: Option<MapBounds>, p| {
            Some(match acc {
                None => MapBounds::new(p.lat, p.lon, p.lat, p.lon),
                Some(b) => MapBounds::new(
                    b.south.min(p.lat),
                    b.west.min(p.lon),
                    b.north.max(p.lat),
                    b.east.max(p.lon),
                ),
            })
        })
    }

    /// Min and max of the finite feature values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.features
            .iter()
            .map(|f| f.value)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lon_lat_order_is_swapped() {
        let p = GeoPosition::from_lon_lat(&[13.05, 47.5, 420.0]).unwrap();
        assert_eq!(p.lat, 47.5);
        assert_eq!(p.lon, 13.05);
        assert!(GeoPosition::from_lon_lat(&[13.05]).is_none());
    }

    #[test]
    fn label_shows_name_and_value() {
        let f = Feature::new("Salzach", GeoPosition::new(47.8, 13.0), -0.25);
        assert_eq!(f.label(), "Name: Salzach\nValue: -0.25");
    }

    #[test]
    fn extent_covers_points_and_lines() {
        let store = FeatureStore::new(
            vec![
                Feature::new("a", GeoPosition::new(46.0, 10.0), 0.1),
                Feature::new("b", GeoPosition::new(48.0, 12.0), 0.2),
                Feature::new("nan", GeoPosition::new(f64::NAN, 0.0), 0.0),
            ],
            vec![LineFeature {
                name: None,
                path: vec![GeoPosition::new(47.0, 9.0), GeoPosition::new(47.5, 16.0)],
            }],
        );
        let b = store.extent().unwrap();
        assert_eq!((b.south, b.west, b.north, b.east), (46.0, 9.0, 48.0, 16.0));
        assert_eq!(store.value_range(), Some((0.0, 0.2)));
    }

    #[test]
    fn unnamed_lines_are_numbered() {
        let named = LineFeature {
            name: Some("Danube".to_string()),
            path: Vec::new(),
        };
        let unnamed = LineFeature {
            name: None,
            path: Vec::new(),
        };
        assert_eq!(named.title(0), "Danube");
        assert_eq!(unnamed.title(2), "Line 3");
    }

    #[test]
    fn empty_store_has_no_extent() {
        let store = FeatureStore::default();
        assert!(store.is_empty());
        assert!(store.extent().is_none());
        assert!(store.value_range().is_none());
    }
}
