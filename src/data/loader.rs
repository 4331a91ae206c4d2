use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Feature, FeatureStore, GeoPosition, LineFeature};
use crate::config::PropertyKeys;

/// Shape problems in an otherwise readable file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("expected a GeoJSON FeatureCollection, found {0}")]
    NotFeatureCollection(String),
    #[error("no JSON object found in script file")]
    NoScriptPayload,
    #[error("missing '{0}' column")]
    MissingColumn(&'static str),
    #[error("column '{column}' has unsupported type {data_type}")]
    ColumnType {
        column: &'static str,
        data_type: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a feature dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.geojson` / `.json` – GeoJSON `FeatureCollection`
/// * `.js`      – the same collection assigned to a variable (`var COUNT = {...};`)
/// * `.csv`     – columns `lat`, `lon`, `name`, `value`
/// * `.parquet` – the same four columns
pub fn load_file(path: &Path, keys: &PropertyKeys) -> Result<FeatureStore> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let store = match ext.as_str() {
        "geojson" | "json" => {
            let text = std::fs::read_to_string(path).context("reading GeoJSON file")?;
            parse_geojson(&text, keys)?
        }
        "js" => {
            let text = std::fs::read_to_string(path).context("reading script file")?;
            parse_geojson(strip_script_wrapper(&text)?, keys)?
        }
        "csv" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!(
        "Loaded {} features and {} lines from {}",
        store.len(),
        store.lines.len(),
        path.display()
    );
    Ok(store)
}

// ---------------------------------------------------------------------------
// GeoJSON loader
// ---------------------------------------------------------------------------

/// Parse a `FeatureCollection`.
///
/// ```json
/// {
///   "type": "FeatureCollection",
///   "features": [
///     {
///       "type": "Feature",
///       "geometry": { "type": "Point", "coordinates": [13.05, 47.5] },
///       "properties": { "NAME": "Salzburg", "trendline_slope_minmmax_normalized_data": -0.31 }
///     }
///   ]
/// }
/// ```
///
/// Points become filterable features. `LineString` and `MultiLineString`
/// geometries become overlays. Anything else, and points without a numeric
/// value, are skipped with a warning.
pub fn parse_geojson(text: &str, keys: &PropertyKeys) -> Result<FeatureStore> {
    let root: JsonValue = serde_json::from_str(text).context("parsing GeoJSON")?;

    let kind = root.get("type").and_then(JsonValue::as_str).unwrap_or("<none>");
    if kind != "FeatureCollection" {
        return Err(LoadError::NotFeatureCollection(kind.to_string()).into());
    }

    let records: &[JsonValue] = match root.get("features") {
        Some(JsonValue::Array(items)) => items.as_slice(),
        Some(JsonValue::Null) | None => &[],
        Some(_) => bail!("'features' is not an array"),
    };

    let mut features = Vec::with_capacity(records.len());
    let mut lines = Vec::new();
    let mut skipped = 0usize;

    for (i, rec) in records.iter().enumerate() {
        let properties = rec.get("properties");
        let name = properties
            .and_then(|p| p.get(&keys.name))
            .and_then(property_to_string);

        let Some(geometry) = rec.get("geometry").filter(|g| !g.is_null()) else {
            log::warn!("Feature {i}: no geometry, skipped");
            skipped += 1;
            continue;
        };

        match geometry.get("type").and_then(JsonValue::as_str) {
            Some("Point") => {
                let Some(position) = geometry
                    .get("coordinates")
                    .and_then(json_coords)
                    .and_then(|c| GeoPosition::from_lon_lat(&c))
                else {
                    log::warn!("Feature {i}: malformed point coordinates, skipped");
                    skipped += 1;
                    continue;
                };
                let Some(value) = properties
                    .and_then(|p| p.get(&keys.value))
                    .and_then(JsonValue::as_f64)
                else {
                    log::warn!("Feature {i}: no numeric '{}' property, skipped", keys.value);
                    skipped += 1;
                    continue;
                };
                features.push(Feature::new(
                    name.unwrap_or_else(|| format!("feature {i}")),
                    position,
                    value,
                ));
            }
            Some("LineString") => match geometry.get("coordinates").and_then(json_path) {
                Some(path) => lines.push(LineFeature { name, path }),
                None => {
                    log::warn!("Feature {i}: malformed LineString, skipped");
                    skipped += 1;
                }
            },
            Some("MultiLineString") => {
                let parts = geometry
                    .get("coordinates")
                    .and_then(JsonValue::as_array)
                    .map(|parts| parts.iter().filter_map(json_path).collect::<Vec<_>>())
                    .unwrap_or_default();
                if parts.is_empty() {
                    log::warn!("Feature {i}: malformed MultiLineString, skipped");
                    skipped += 1;
                }
                lines.extend(parts.into_iter().map(|path| LineFeature {
                    name: name.clone(),
                    path,
                }));
            }
            other => {
                log::warn!("Feature {i}: unsupported geometry {other:?}, skipped");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} of {} features", records.len());
    }

    Ok(FeatureStore::new(features, lines))
}

/// Strip a `var NAME = {...};` wrapper, keeping the outermost object.
fn strip_script_wrapper(text: &str) -> Result<&str, LoadError> {
    let start = text.find('{').ok_or(LoadError::NoScriptPayload)?;
    let end = text.rfind('}').ok_or(LoadError::NoScriptPayload)?;
    if end < start {
        return Err(LoadError::NoScriptPayload);
    }
    Ok(&text[start..=end])
}

fn property_to_string(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

fn json_coords(val: &JsonValue) -> Option<Vec<f64>> {
    val.as_array()?.iter().map(JsonValue::as_f64).collect()
}

fn json_path(val: &JsonValue) -> Option<Vec<GeoPosition>> {
    let path: Option<Vec<GeoPosition>> = val
        .as_array()?
        .iter()
        .map(|c| json_coords(c).and_then(|c| GeoPosition::from_lon_lat(&c)))
        .collect();
    path.filter(|p| p.len() >= 2)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    name: Option<String>,
    value: Option<f64>,
}

/// CSV layout: header row with `lat`, `lon`, `name` and `value` columns.
/// Extra columns are ignored. Rows with an empty coordinate or value are
/// skipped.
fn load_csv(path: &Path) -> Result<FeatureStore> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;

    let mut features = Vec::new();
    let mut skipped = 0usize;

    for (row_no, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let (Some(lat), Some(lon), Some(value)) = (row.lat, row.lon, row.value) else {
            skipped += 1;
            continue;
        };
        features.push(Feature::new(
            row.name.unwrap_or_else(|| format!("feature {row_no}")),
            GeoPosition::new(lat, lon),
            value,
        ));
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} CSV rows with an empty coordinate or value");
    }

    Ok(FeatureStore::from_features(features))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one feature per row.
///
/// Expected schema:
/// - `lat`, `lon`: Float64 or Float32
/// - `value`: Float64 or Float32, nulls are skipped
/// - `name`: Utf8 / LargeUtf8, optional
fn load_parquet(path: &Path) -> Result<FeatureStore> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut features = Vec::new();
    let mut skipped = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let lat = f64_column(&batch, "lat")?;
        let lon = f64_column(&batch, "lon")?;
        let value = f64_column(&batch, "value")?;
        let name = batch.column_by_name("name");

        for row in 0..batch.num_rows() {
            let (Some(lat), Some(lon), Some(value)) = (lat[row], lon[row], value[row]) else {
                skipped += 1;
                continue;
            };
            let name = name
                .and_then(|col| string_value(col, row))
                .unwrap_or_else(|| format!("feature {}", features.len() + skipped));
            features.push(Feature::new(name, GeoPosition::new(lat, lon), value));
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} parquet rows with null coordinates or value");
    }

    Ok(FeatureStore::from_features(features))
}

// -- Parquet / Arrow helpers --

/// Read a Float64 or Float32 column into `Option<f64>` per row.
fn f64_column(batch: &RecordBatch, column: &'static str) -> Result<Vec<Option<f64>>> {
    let col = batch
        .column_by_name(column)
        .ok_or(LoadError::MissingColumn(column))?;

    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map(f64::from)).collect())
    } else {
        Err(LoadError::ColumnType {
            column,
            data_type: format!("{:?}", col.data_type()),
        }
        .into())
    }
}

fn string_value(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|s| s.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("trendmap-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [13.05, 47.8] },
              "properties": { "NAME": "Salzburg", "trendline_slope_minmmax_normalized_data": -0.5 } },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [16.37, 48.2] },
              "properties": { "NAME": "Wien", "trendline_slope_minmmax_normalized_data": 0 } },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [11.4, 47.26] },
              "properties": { "NAME": 6020, "trendline_slope_minmmax_normalized_data": 0.8 } },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [14.3, 46.6] },
              "properties": { "NAME": "no value" } },
            { "type": "Feature",
              "geometry": { "type": "LineString", "coordinates": [[13.0, 47.8], [13.5, 48.2], [14.0, 48.3]] },
              "properties": { "NAME": "Salzach" } },
            { "type": "Feature",
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
              "properties": {} }
        ]
    }"#;

    #[test]
    fn geojson_points_and_lines() {
        let store = parse_geojson(COLLECTION, &PropertyKeys::default()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.features[0].name, "Salzburg");
        assert_eq!(store.features[0].position, GeoPosition::new(47.8, 13.05));
        assert_eq!(store.features[1].value, 0.0);
        assert_eq!(store.features[2].name, "6020");
        assert_eq!(store.lines.len(), 1);
        assert_eq!(store.lines[0].name.as_deref(), Some("Salzach"));
        assert_eq!(store.lines[0].path.len(), 3);
    }

    #[test]
    fn custom_property_keys() {
        let text = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1, 2] },
              "properties": { "station": "A", "slope": 0.25 } } ] }"#;
        let keys = PropertyKeys {
            name: "station".into(),
            value: "slope".into(),
        };
        let store = parse_geojson(text, &keys).unwrap();
        assert_eq!(store.features, vec![Feature::new("A", GeoPosition::new(2.0, 1.0), 0.25)]);
    }

    #[test]
    fn empty_collection_loads_empty() {
        let store = parse_geojson(
            r#"{ "type": "FeatureCollection", "features": [] }"#,
            &PropertyKeys::default(),
        )
        .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn bare_feature_is_rejected() {
        let err = parse_geojson(r#"{ "type": "Feature" }"#, &PropertyKeys::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::NotFeatureCollection(kind)) if kind == "Feature"
        ));
    }

    #[test]
    fn script_wrapper_is_stripped() {
        let script = format!("var COUNT = {COLLECTION};\n");
        let path = temp_file("count.js", &script);
        let store = load_file(&path, &PropertyKeys::default()).unwrap();
        assert_eq!(store.len(), 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn script_without_object_fails() {
        assert!(matches!(
            strip_script_wrapper("var COUNT;"),
            Err(LoadError::NoScriptPayload)
        ));
    }

    #[test]
    fn csv_rows() {
        let path = temp_file(
            "points.csv",
            "name,lat,lon,value,extra\nA,47.0,13.0,-0.2,x\nB,48.0,14.0,,y\nC,46.5,12.5,0.9,z\n",
        );
        let store = load_file(&path, &PropertyKeys::default()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.features[1].name, "C");
        assert_eq!(store.features[1].value, 0.9);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn csv_rows_with_empty_coordinates_are_skipped() {
        let path = temp_file(
            "holes.csv",
            "name,lat,lon,value\nA,47.0,13.0,-0.2\nB,,14.0,0.5\nC,46.5,,0.1\nD,46.0,12.0,0.3\n",
        );
        let store = load_file(&path, &PropertyKeys::default()).unwrap();
        let names: Vec<&str> = store.features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A", "D"]);
        assert_eq!(store.features[1].position, GeoPosition::new(46.0, 12.0));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn parquet_rows_skip_null_values() {
        use arrow::array::Float32Array;
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("lat", DataType::Float32, false),
            Field::new("lon", DataType::Float64, false),
            Field::new("value", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("A"), None, Some("C")])),
                Arc::new(Float32Array::from(vec![47.5, 48.0, 46.0])),
                Arc::new(Float64Array::from(vec![13.0, 14.0, 12.0])),
                Arc::new(Float64Array::from(vec![Some(-0.4), Some(0.3), None])),
            ],
        )
        .unwrap();

        let path = std::env::temp_dir().join(format!("trendmap-{}-rows.parquet", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let store = load_file(&path, &PropertyKeys::default()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.features[0].name, "A");
        assert_eq!(store.features[0].position.lat, 47.5);
        assert_eq!(store.features[1].name, "feature 1");
        assert_eq!(store.features[1].value, 0.3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn parquet_without_value_column_fails() {
        use arrow::datatypes::{Field, Schema};
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("lat", DataType::Float64, false),
            Field::new("lon", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![47.5])),
                Arc::new(Float64Array::from(vec![13.0])),
            ],
        )
        .unwrap();

        let path = std::env::temp_dir().join(format!("trendmap-{}-novalue.parquet", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_file(&path, &PropertyKeys::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingColumn("value"))
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_extension_fails() {
        let err = load_file(Path::new("data.xlsx"), &PropertyKeys::default()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
