/// Map layer: what the map canvas shows and how it is rebuilt.
///
/// ```text
///   FeatureStore ──► LayerSynchronizer ──► MarkerLayer ──► ui::map_view
///                     (viewport ∧ range)    markers / clusters   (walkers)
/// ```

pub mod cluster;
pub mod layer;
pub mod viewport;
