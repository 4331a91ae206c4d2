use std::fmt;

use eframe::egui::Color32;
use palette::{Mix, Srgb};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Rgb – integer colour triple
// ---------------------------------------------------------------------------

/// An 8-bit RGB triple. Displays as `rgb(r,g,b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.0, self.1, self.2)
    }

    /// Same colour with `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Color32 {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(self.0, self.1, self.2, alpha)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

// ---------------------------------------------------------------------------
// Colour mapping: normalized value → Rgb
// ---------------------------------------------------------------------------

/// How normalized values are coloured on the map and in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Green below zero, red above, white at exactly zero.
    #[default]
    Threshold,
    /// Continuous green → red ramp over `[-1, 1]`.
    Gradient,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 2] = [ColorScheme::Threshold, ColorScheme::Gradient];

    pub fn color(self, value: f64) -> Rgb {
        match self {
            ColorScheme::Threshold => threshold_color(value),
            ColorScheme::Gradient => gradient_color(value),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Threshold => "Threshold",
            ColorScheme::Gradient => "Gradient",
        }
    }
}

/// Three-way sign colouring. Exact comparison with zero, no tolerance band.
/// NaN falls through to white.
pub fn threshold_color(value: f64) -> Rgb {
    if value < 0.0 {
        Rgb::GREEN
    } else if value > 0.0 {
        Rgb::RED
    } else {
        Rgb::WHITE
    }
}

/// Linear green (0,255,0) → red (255,0,0) ramp over `[-1, 1]`.
///
/// The ratio `(value + 1) / 2` is clamped to `[0, 1]`, so out-of-range values
/// take the end colours. NaN maps to the midpoint.
pub fn gradient_color(value: f64) -> Rgb {
    let ratio = (value + 1.0) / 2.0;
    let ratio = if ratio.is_nan() { 0.5 } else { ratio.clamp(0.0, 1.0) };

    let low: Srgb<f64> = Srgb::new(0.0, 1.0, 0.0);
    let high: Srgb<f64> = Srgb::new(1.0, 0.0, 0.0);
    let mixed = low.mix(high, ratio);

    Rgb(channel(mixed.red), channel(mixed.green), channel(mixed.blue))
}

/// `[0, 1]` → byte, rounding half up.
fn channel(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

/// Tick labels printed under the legend bar.
pub const LEGEND_TICKS: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

/// Evenly spaced `(value, colour)` samples over `[-1, 1]` for painting the
/// legend bar.
pub fn legend_stops(scheme: ColorScheme, n: usize) -> Vec<(f64, Color32)> {
    if n < 2 {
        return vec![(0.0, scheme.color(0.0).to_color32())];
    }
    (0..n)
        .map(|i| {
            let v = -1.0 + 2.0 * i as f64 / (n - 1) as f64;
            (v, scheme.color(v).to_color32())
        })
        .collect()
}
