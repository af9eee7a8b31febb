//! Sliding-window sample history backing the sparkline charts.
//!
//! Samples are stored already rescaled into chart coordinates: the chart is
//! [`CHART_HEIGHT`] units tall with `0` at the top, so a high reading maps to
//! a small value.

use std::collections::VecDeque;

/// Samples retained per series.
pub const HISTORY_LEN: usize = 50;

/// Height of the chart coordinate space.
pub const CHART_HEIGHT: f64 = 40.0;

/// Value every slot holds before the first tick (chart mid-line).
pub const HISTORY_FILL: f64 = 20.0;

/// Distance input range mapped onto the chart, in millimeters.
pub const DISTANCE_RANGE: (f64, f64) = (0.0, 300.0);

/// Temperature input range mapped onto the chart, in degrees Celsius.
pub const TEMPERATURE_RANGE: (f64, f64) = (30.0, 70.0);

/// Linearly rescale `v` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// No clamping: out-of-range inputs extrapolate.
pub fn map_value(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (v - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Which series of a [`HistoryBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Distance,
    Temperature,
}

impl Series {
    pub fn label(self) -> &'static str {
        match self {
            Self::Distance => "Ultra distance",
            Self::Temperature => "CPU temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Distance => "mm",
            Self::Temperature => "°C",
        }
    }

    /// Map a raw reading into chart coordinates for this series.
    pub fn map(self, raw: f64) -> f64 {
        let (lo, hi) = match self {
            Self::Distance => DISTANCE_RANGE,
            Self::Temperature => TEMPERATURE_RANGE,
        };
        map_value(raw, lo, hi, CHART_HEIGHT, 0.0)
    }
}

/// Two fixed-length FIFO windows: distance and temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    distance: VecDeque<f64>,
    temperature: VecDeque<f64>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HISTORY_LEN)
    }
}

impl HistoryBuffer {
    /// Create a buffer of `capacity` slots per series, pre-filled with
    /// [`HISTORY_FILL`].
    pub fn new(capacity: usize) -> Self {
        Self {
            distance: std::iter::repeat_n(HISTORY_FILL, capacity).collect(),
            temperature: std::iter::repeat_n(HISTORY_FILL, capacity).collect(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push one raw reading into both series, evicting the oldest samples.
    pub fn push(&mut self, distance_mm: f64, temp_c: f64) {
        push_bounded(
            &mut self.distance,
            Series::Distance.map(distance_mm),
            self.capacity,
        );
        push_bounded(
            &mut self.temperature,
            Series::Temperature.map(temp_c),
            self.capacity,
        );
    }

    /// Mapped samples of one series, oldest first.
    pub fn series(&self, series: Series) -> &VecDeque<f64> {
        match series {
            Series::Distance => &self.distance,
            Series::Temperature => &self.temperature,
        }
    }

    /// `(index, height)` points for plotting with the origin at the bottom.
    pub fn chart_points(&self, series: Series) -> Vec<(f64, f64)> {
        self.series(series)
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, CHART_HEIGHT - v))
            .collect()
    }
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    window.push_back(value);
    while window.len() > capacity {
        window.pop_front();
    }
}
