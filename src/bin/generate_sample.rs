use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

const N_STATIONS: usize = 400;
const OUTPUT_STEM: &str = "sample_stations";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Station {
    name: String,
    lat: f64,
    lon: f64,
    value: f64,
}

/// Raw slopes get a west→east trend plus noise, then min-max scaling to
/// `[-1, 1]`. A handful are exactly zero so the white class shows up.
fn generate_stations(rng: &mut SimpleRng) -> Vec<Station> {
    let raw: Vec<(f64, f64, f64)> = (0..N_STATIONS)
        .map(|_| {
            let lat = rng.uniform(45.6, 48.9);
            let lon = rng.uniform(8.5, 17.2);
            let slope = 0.04 * (lon - 12.8) + rng.gauss(0.0, 0.12);
            (lat, lon, slope)
        })
        .collect();

    let min = raw.iter().map(|r| r.2).fold(f64::INFINITY, f64::min);
    let max = raw.iter().map(|r| r.2).fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(f64::EPSILON);

    raw.into_iter()
        .enumerate()
        .map(|(i, (lat, lon, slope))| {
            let value = if i % 50 == 0 {
                0.0
            } else {
                let scaled = (slope - min) / span * 2.0 - 1.0;
                (scaled * 1000.0).round() / 1000.0
            };
            Station {
                name: format!("Station {:03}", i + 1),
                lat: (lat * 1e5).round() / 1e5,
                lon: (lon * 1e5).round() / 1e5,
                value,
            }
        })
        .collect()
}

/// Rough course of the Danube through the sample area.
fn river() -> Vec<[f64; 2]> {
    vec![
        [9.0, 48.05],
        [10.0, 48.45],
        [11.4, 48.75],
        [12.1, 48.98],
        [13.45, 48.57],
        [14.3, 48.3],
        [15.6, 48.4],
        [16.37, 48.21],
        [17.1, 48.14],
    ]
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let stations = generate_stations(&mut rng);

    // ---- GeoJSON ----
    let mut features: Vec<serde_json::Value> = stations
        .iter()
        .map(|s| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [s.lon, s.lat] },
                "properties": {
                    "NAME": s.name,
                    "trendline_slope_minmmax_normalized_data": s.value,
                }
            })
        })
        .collect();
    features.push(json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": river() },
        "properties": { "NAME": "Danube" }
    }));
    let collection = json!({ "type": "FeatureCollection", "features": features });

    let geojson_path = format!("{OUTPUT_STEM}.geojson");
    let text = serde_json::to_string_pretty(&collection).expect("Failed to serialize GeoJSON");
    std::fs::write(&geojson_path, text).expect("Failed to write GeoJSON");

    // ---- CSV ----
    let csv_path = format!("{OUTPUT_STEM}.csv");
    let mut writer = csv::Writer::from_path(&csv_path).expect("Failed to create CSV");
    writer
        .write_record(["name", "lat", "lon", "value"])
        .expect("Failed to write CSV header");
    for s in &stations {
        writer
            .write_record([
                s.name.clone(),
                s.lat.to_string(),
                s.lon.to_string(),
                s.value.to_string(),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("value", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                stations.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(stations.iter().map(|s| s.lat).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(stations.iter().map(|s| s.lon).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(stations.iter().map(|s| s.value).collect::<Vec<_>>())),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = format!("{OUTPUT_STEM}.parquet");
    let file = std::fs::File::create(&parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} stations to {geojson_path}, {csv_path} and {parquet_path}",
        stations.len()
    );
}
