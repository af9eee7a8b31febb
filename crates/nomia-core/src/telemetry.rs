//! The shared telemetry snapshot consumed by every display.
//!
//! Mock, data and live sources all produce a [`Telemetry`] value; the
//! dashboard never needs to know which one it is looking at. On the wire a
//! snapshot is a single JSON object:
//!
//! ```json
//! {"cpu_temp":50,"uptime":"00:01:00","ultra_dist":120,"mode":"AUTO","logs":["a"]}
//! ```
//!
//! `cpu_temp` is either a number or a placeholder string such as `"--"` when
//! the remote unit has nothing to report.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::uptime::parse_uptime;

/// Mode shown the moment the live link drops.
pub const MODE_LINK_LOST: &str = "LINK_LOST";
/// Mode shown before any live frame has arrived.
pub const MODE_OFFLINE: &str = "OFFLINE";
/// Mode shown by the mock source before its first tick.
pub const MODE_BOOTING: &str = "BOOTING";
/// Mode label of the data (history) source.
pub const MODE_DATA_STREAM: &str = "DATA_STREAM";
/// Placeholder temperature reported while no sensor value is available.
pub const TEMP_PLACEHOLDER: &str = "--";

// ---------------------------------------------------------------------------
// CpuTemp
// ---------------------------------------------------------------------------

/// CPU temperature: a reading in degrees Celsius or a placeholder string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CpuTemp {
    Celsius(f64),
    Placeholder(String),
}

impl CpuTemp {
    pub fn placeholder() -> Self {
        Self::Placeholder(TEMP_PLACEHOLDER.to_string())
    }

    /// Numeric reading, if there is one.
    pub fn celsius(&self) -> Option<f64> {
        match self {
            Self::Celsius(c) => Some(*c),
            Self::Placeholder(_) => None,
        }
    }
}

impl Default for CpuTemp {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl From<f64> for CpuTemp {
    fn from(c: f64) -> Self {
        Self::Celsius(c)
    }
}

impl From<u32> for CpuTemp {
    fn from(c: u32) -> Self {
        Self::Celsius(f64::from(c))
    }
}

impl fmt::Display for CpuTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius(c) if c.fract() == 0.0 => write!(f, "{c:.0}"),
            Self::Celsius(c) => write!(f, "{c:.1}"),
            Self::Placeholder(p) => f.write_str(p),
        }
    }
}

// ---------------------------------------------------------------------------
// FrameError
// ---------------------------------------------------------------------------

/// Reasons an inbound telemetry frame is rejected.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid telemetry frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cpu_temp must be a finite, non-negative number (got {0})")]
    NegativeTemperature(f64),
    #[error("uptime {0:?} is not HH:MM:SS")]
    Uptime(String),
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Snapshot of the rover's status values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub cpu_temp: CpuTemp,
    pub uptime: String,
    /// Ultrasonic distance in millimeters. Fractional readings are floored.
    #[serde(deserialize_with = "floor_distance")]
    pub ultra_dist: u32,
    pub mode: String,
    /// Most recent log lines, oldest first.
    #[serde(default)]
    pub logs: VecDeque<String>,
    /// Backend run mode (`MOCK` / `LIVE`), when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_mode: Option<String>,
    /// Backend hardware link status, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esp32_status: Option<String>,
}

/// Accept any JSON number in `0..=u32::MAX` and floor it to whole millimeters.
fn floor_distance<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let mm = f64::deserialize(deserializer)?;
    if !(mm.is_finite() && mm >= 0.0 && mm < f64::from(u32::MAX) + 1.0) {
        return Err(serde::de::Error::custom(format!(
            "ultra_dist must be a non-negative distance in mm (got {mm})"
        )));
    }
    Ok(mm.floor() as u32)
}

impl Telemetry {
    pub fn new(cpu_temp: impl Into<CpuTemp>, ultra_dist: u32, mode: impl Into<String>) -> Self {
        Self {
            cpu_temp: cpu_temp.into(),
            uptime: "00:00:00".to_string(),
            ultra_dist,
            mode: mode.into(),
            logs: VecDeque::new(),
            run_mode: None,
            esp32_status: None,
        }
    }

    /// Snapshot shown by the live view before the first frame.
    pub fn offline() -> Self {
        Self::new(CpuTemp::placeholder(), 0, MODE_OFFLINE)
    }

    /// Parse and validate one JSON frame.
    pub fn from_frame(text: &str) -> Result<Self, FrameError> {
        let telemetry: Telemetry = serde_json::from_str(text)?;
        telemetry.validate()?;
        Ok(telemetry)
    }

    /// Serialize to a single-line JSON frame.
    pub fn to_frame(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), FrameError> {
        if let CpuTemp::Celsius(c) = self.cpu_temp
            && !(c.is_finite() && c >= 0.0)
        {
            return Err(FrameError::NegativeTemperature(c));
        }
        if parse_uptime(&self.uptime).is_none() {
            return Err(FrameError::Uptime(self.uptime.clone()));
        }
        Ok(())
    }

    /// Append a log line, evicting the oldest lines beyond `cap`.
    pub fn push_log(&mut self, line: impl Into<String>, cap: usize) {
        self.logs.push_back(line.into());
        self.clamp_logs(cap);
    }

    /// Keep only the newest `cap` log lines.
    pub fn clamp_logs(&mut self, cap: usize) {
        while self.logs.len() > cap {
            self.logs.pop_front();
        }
    }
}
