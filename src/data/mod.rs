/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .geojson / .js / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → FeatureStore
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ FeatureStore │  Vec<Feature>, line overlays
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  viewport ∧ value range → visible indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
