use std::collections::BTreeMap;

use super::layer::Marker;
use crate::color::ColorScheme;
use crate::data::filter::MapBounds;
use crate::data::model::GeoPosition;

/// A group of nearby markers drawn as one badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Mean of the members' positions.
    pub center: GeoPosition,
    /// Indices into the layer's marker list.
    pub members: Vec<usize>,
    pub mean_value: f64,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    pub fn label(&self, scheme: ColorScheme) -> String {
        format!(
            "{} features\nMean value: {:.3} ({})",
            self.members.len(),
            self.mean_value,
            scheme.color(self.mean_value)
        )
    }
}

/// Bucket markers into a grid of roughly square cells over the viewport.
///
/// The cell is the viewport's longitude span divided by `cells_across`; its
/// latitude edge shrinks by the cosine of the centre latitude so cells cover
/// about the same ground distance both ways. Clusters split as the user
/// zooms in. Output order is stable: cells sorted by grid coordinate,
/// members in marker order.
pub fn grid_cluster(markers: &[Marker], bounds: &MapBounds, cells_across: usize) -> Vec<Cluster> {
    let cell_lon = bounds.width() / cells_across.max(1) as f64;
    let cell_lat = cell_lon * bounds.center().lat.to_radians().cos();
    if !(cell_lon.is_finite() && cell_lon > 0.0 && cell_lat > 0.0) {
        return markers
            .iter()
            .enumerate()
            .map(|(i, m)| Cluster {
                center: m.position,
                members: vec![i],
                mean_value: m.value,
            })
            .collect();
    }

    let mut grid: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (i, m) in markers.iter().enumerate() {
        let key = (
            (m.position.lon / cell_lon).floor() as i64,
            (m.position.lat / cell_lat).floor() as i64,
        );
        grid.entry(key).or_default().push(i);
    }

    grid.into_values()
        .map(|members| {
            let n = members.len() as f64;
            let (lat, lon, value) = members.iter().fold((0.0, 0.0, 0.0), |(lat, lon, v), &i| {
                let m = &markers[i];
                (lat + m.position.lat, lon + m.position.lon, v + m.value)
            });
            Cluster {
                center: GeoPosition::new(lat / n, lon / n),
                members,
                mean_value: value / n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn marker(feature: usize, lat: f64, lon: f64, value: f64) -> Marker {
        Marker {
            feature,
            position: GeoPosition::new(lat, lon),
            value,
            fill: Rgb::WHITE,
            label: String::new(),
        }
    }

    #[test]
    fn nearby_points_merge_distant_points_do_not() {
        let markers = vec![
            marker(0, 47.50, 13.00, -0.4),
            marker(1, 47.51, 13.01, 0.2),
            marker(2, 40.00, -3.70, 0.9),
        ];
        let bounds = MapBounds::new(30.0, -20.0, 60.0, 40.0);
        let clusters = grid_cluster(&markers, &bounds, 12);

        assert_eq!(clusters.len(), 2);
        let pair = clusters.iter().find(|c| c.len() == 2).unwrap();
        assert_eq!(pair.members, vec![0, 1]);
        assert!((pair.mean_value - -0.1).abs() < 1e-12);
        assert!((pair.center.lon - 13.005).abs() < 1e-9);
        assert!(clusters.iter().any(|c| c.is_single() && c.members == vec![2]));
    }

    #[test]
    fn every_marker_lands_in_exactly_one_cluster() {
        let markers: Vec<Marker> = (0..50)
            .map(|i| marker(i, 45.0 + i as f64 * 0.07, 9.0 + i as f64 * 0.15, 0.0))
            .collect();
        let bounds = MapBounds::new(44.0, 8.0, 50.0, 18.0);
        let clusters = grid_cluster(&markers, &bounds, 6);
        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn degenerate_viewport_yields_singletons() {
        let markers = vec![marker(0, 47.0, 13.0, 0.1), marker(1, 47.0, 13.0, 0.2)];
        let bounds = MapBounds::new(47.0, 13.0, 47.0, 13.0);
        let clusters = grid_cluster(&markers, &bounds, 12);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_single));
    }
}
