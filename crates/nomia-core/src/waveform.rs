//! Synthetic sensor waveforms and the history-oriented "data" source.
//!
//! Distance follows `sin(t)` and temperature `cos(t / 2)` around fixed
//! baselines, each with uniform noise. `t` is wall-clock seconds since the
//! Unix epoch, so the curve does not restart when a view is reopened.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::config::DataConfig;
use crate::display::TelemetrySource;
use crate::history::HistoryBuffer;
use crate::telemetry::{MODE_DATA_STREAM, Telemetry};
use crate::uptime::format_uptime;

// ---------------------------------------------------------------------------
// Waveform simulator
// ---------------------------------------------------------------------------

/// Shape of the two synthetic waveforms.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformConfig {
    pub distance_base: f64,
    pub distance_amplitude: f64,
    /// Peak-to-peak width of the uniform distance noise.
    pub distance_noise: f64,
    pub temperature_base: f64,
    pub temperature_amplitude: f64,
    /// Peak-to-peak width of the uniform temperature noise.
    pub temperature_noise: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            distance_base: 150.0,
            distance_amplitude: 50.0,
            distance_noise: 40.0,
            temperature_base: 45.0,
            temperature_amplitude: 5.0,
            temperature_noise: 4.0,
        }
    }
}

/// One simulated reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub distance_mm: u32,
    pub temp_c: u32,
}

/// Generates [`Reading`]s from the configured waveforms.
#[derive(Debug, Clone)]
pub struct WaveformSimulator<R> {
    config: WaveformConfig,
    rng: R,
}

impl<R: Rng> WaveformSimulator<R> {
    pub fn new(config: WaveformConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Noise-free value of both waveforms at `t` seconds.
    pub fn baseline(&self, t: f64) -> (f64, f64) {
        let c = &self.config;
        (
            c.distance_base + c.distance_amplitude * t.sin(),
            c.temperature_base + c.temperature_amplitude * (t * 0.5).cos(),
        )
    }

    /// Sample both waveforms at `t` seconds, add noise, clamp at zero and
    /// floor to whole units.
    pub fn sample(&mut self, t: f64) -> Reading {
        let (distance, temperature) = self.baseline(t);
        let distance_noise = (self.rng.random::<f64>() - 0.5) * self.config.distance_noise;
        let temperature_noise =
            (self.rng.random::<f64>() - 0.5) * self.config.temperature_noise;
        Reading {
            distance_mm: floor_non_negative(distance + distance_noise),
            temp_c: floor_non_negative(temperature + temperature_noise),
        }
    }
}

fn floor_non_negative(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.floor().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Seconds since the Unix epoch as a float.
pub fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ---------------------------------------------------------------------------
// DataFeed
// ---------------------------------------------------------------------------

/// Telemetry source driven by the waveform simulator, with sparkline history.
pub struct DataFeed<R> {
    simulator: WaveformSimulator<R>,
    telemetry: Telemetry,
    history: HistoryBuffer,
    log_cap: usize,
    started: Instant,
    ticks: u64,
}

impl<R: Rng> DataFeed<R> {
    pub fn new(config: DataConfig, rng: R) -> Self {
        Self {
            simulator: WaveformSimulator::new(config.waveform, rng),
            telemetry: Telemetry::new(45_u32, 120, MODE_DATA_STREAM),
            history: HistoryBuffer::new(config.history_len),
            log_cap: config.log_cap,
            started: Instant::now(),
            ticks: 0,
        }
    }

    /// Advance one tick at wall-clock time `wall_secs`, `elapsed` into the
    /// session.
    pub fn tick(&mut self, wall_secs: f64, elapsed: Duration) -> Reading {
        let reading = self.simulator.sample(wall_secs);
        let t = &mut self.telemetry;
        t.ultra_dist = reading.distance_mm;
        t.cpu_temp = reading.temp_c.into();
        t.uptime = format_uptime(elapsed);
        t.push_log(
            format!(
                "TELEMETRY_SYNC: {}mm | {}°C",
                reading.distance_mm, reading.temp_c
            ),
            self.log_cap,
        );
        self.history
            .push(f64::from(reading.distance_mm), f64::from(reading.temp_c));
        self.ticks += 1;
        reading
    }

    /// Advance one tick using the real clocks.
    pub fn tick_now(&mut self) -> Reading {
        self.tick(wall_clock_secs(), self.started.elapsed())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl<R> TelemetrySource for DataFeed<R> {
    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn history(&self) -> Option<&HistoryBuffer> {
        Some(&self.history)
    }

    fn label(&self) -> &'static str {
        "DATA"
    }
}
