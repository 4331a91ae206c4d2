use std::cell::Cell;
use std::rc::Rc;

use crate::color::{ColorScheme, Rgb};

// ---------------------------------------------------------------------------
// Chart instance
// ---------------------------------------------------------------------------

/// One point of the scatter chart: `x` is the position in the visible set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub color: Rgb,
}

/// A built scatter chart. Counts itself in a shared tally while alive so the
/// projector can prove old instances are released.
#[derive(Debug)]
pub struct ChartInstance {
    id: u64,
    pub title: &'static str,
    pub points: Vec<ScatterPoint>,
    live: Rc<Cell<usize>>,
}

impl ChartInstance {
    fn new(id: u64, points: Vec<ScatterPoint>, live: Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            id,
            title: "Normalized Data",
            points,
            live,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Y range to display. Always includes zero, whatever the data sign.
    pub fn y_extent(&self) -> (f64, f64) {
        self.points
            .iter()
            .map(|p| p.y)
            .filter(|y| y.is_finite())
            .fold((0.0, 0.0), |(lo, hi), y| (lo.min(y), hi.max(y)))
    }
}

impl Drop for ChartInstance {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Scatter projector
// ---------------------------------------------------------------------------

/// Owns at most one chart. Each projection tears down the previous chart
/// before building the next.
#[derive(Debug, Default)]
pub struct ScatterProjector {
    chart: Option<ChartInstance>,
    live: Rc<Cell<usize>>,
    next_id: u64,
}

impl ScatterProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chart with one built from `values`: point *i* sits at
    /// `(i, values[i])`, coloured by `scheme`.
    pub fn project(&mut self, values: &[f64], scheme: ColorScheme) -> &ChartInstance {
        self.discard();

        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| ScatterPoint {
                x: i as f64,
                y: v,
                color: scheme.color(v),
            })
            .collect();

        self.next_id += 1;
        log::trace!("Building chart #{} with {} points", self.next_id, values.len());
        self.chart
            .insert(ChartInstance::new(self.next_id, points, Rc::clone(&self.live)))
    }

    /// Release the current chart, if any.
    pub fn discard(&mut self) {
        if let Some(old) = self.chart.take() {
            log::trace!("Destroying chart #{}", old.id);
            drop(old);
        }
    }

    pub fn chart(&self) -> Option<&ChartInstance> {
        self.chart.as_ref()
    }

    /// Number of chart instances currently alive.
    pub fn live_instances(&self) -> usize {
        self.live.get()
    }
}
