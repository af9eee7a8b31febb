//! The contract between telemetry sources and the dashboard.
//!
//! Any type that can hand out a [`Telemetry`] snapshot (and optionally a
//! [`HistoryBuffer`]) can drive the same rendering code. The helpers below
//! are the only formatting rules the display applies.

use std::time::Duration;

use crate::history::HistoryBuffer;
use crate::telemetry::{CpuTemp, Telemetry};

/// Full-scale distance of the proximity gauge, in millimeters.
pub const GAUGE_FULL_SCALE_MM: f64 = 500.0;

/// Period of the disconnected-link flicker.
pub const GLITCH_PERIOD: Duration = Duration::from_millis(2500);

/// How long each flicker lasts.
pub const GLITCH_DURATION: Duration = Duration::from_millis(150);

/// A source the dashboard can render.
pub trait TelemetrySource {
    /// Current snapshot.
    fn telemetry(&self) -> &Telemetry;

    /// Sparkline history, for sources that keep one.
    fn history(&self) -> Option<&HistoryBuffer> {
        None
    }

    /// Link state for networked sources; `None` for local simulations.
    fn connected(&self) -> Option<bool> {
        None
    }

    /// Short tag shown in the header.
    fn label(&self) -> &'static str;
}

/// `"50°C"`, `"48.5°C"`, `"--°C"`.
pub fn format_temperature(temp: &CpuTemp) -> String {
    format!("{temp}°C")
}

pub fn format_distance(mm: u32) -> String {
    format!("{mm}mm")
}

/// Fill ratio of the proximity gauge, `0.0..=1.0`.
pub fn distance_ratio(mm: u32) -> f64 {
    (f64::from(mm) / GAUGE_FULL_SCALE_MM).min(1.0)
}

/// Whether the degraded-link flicker is visible `elapsed` into the session.
///
/// Purely cosmetic; always false while connected.
pub fn glitch_active(connected: bool, elapsed: Duration) -> bool {
    !connected && elapsed.as_millis() % GLITCH_PERIOD.as_millis() < GLITCH_DURATION.as_millis()
}
