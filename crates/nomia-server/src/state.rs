//! Backend state: the snapshot the server broadcasts every tick, plus the
//! effects of operator commands on it.
//!
//! Pure and synchronous like the rest of the model; the clock and the rng
//! come from the caller.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use nomia_core::{Command, CommandKind, CpuTemp, Telemetry, format_uptime};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ServerError;

/// Lines kept in the server's log buffer.
pub const LOG_CAP: usize = 100;
/// Ticks spent in each mock profile.
pub const MOCK_DWELL_TICKS: u64 = 20;
/// Mock distance jitter, +/- millimeters.
pub const MOCK_JITTER_MM: i64 = 5;

const MOCK_FRAME_LOGS: usize = 12;
const LIVE_FRAME_LOGS: usize = 5;
/// Canned lines already among this many recent lines are not repeated.
const DUPLICATE_WINDOW: usize = 5;

pub const MODE_INITIALIZING: &str = "INITIALIZING";
pub const MODE_HALT: &str = "HALT";
pub const MODE_SEARCHING: &str = "OFFLINE / SEARCHING";
pub const ESP32_MOCK: &str = "MOCK_ACTIVE";
pub const ESP32_SEARCHING: &str = "SEARCHING_SERIAL...";

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// Where the backend's numbers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Cycle through canned profiles.
    Mock,
    /// Wait for hardware; until then broadcast an offline snapshot.
    #[default]
    Live,
}

impl RunMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mock => "MOCK",
            Self::Live => "LIVE",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RunMode {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOCK" => Ok(Self::Mock),
            "LIVE" => Ok(Self::Live),
            _ => Err(ServerError::RunMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Mock profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct MockProfile {
    pub mode: &'static str,
    pub temp_c: f64,
    pub distance_mm: u32,
    pub logs: &'static [&'static str],
}

pub const MOCK_PROFILES: [MockProfile; 3] = [
    MockProfile {
        mode: "PATROL",
        temp_c: 48.5,
        distance_mm: 340,
        logs: &["[SYS] PATROL_ACTIVE", "[NAV] PATH_OPTIMIZED"],
    },
    MockProfile {
        mode: "ALARM",
        temp_c: 62.1,
        distance_mm: 45,
        logs: &["[CRT] OBSTACLE_DETECTED", "[CRT] EMERGENCY_STOP"],
    },
    MockProfile {
        mode: "DOCKING",
        temp_c: 42.0,
        distance_mm: 120,
        logs: &["[SYS] DOCKING_INIT", "[NAV] ALIGNING_BEACON"],
    },
];

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One broadcast frame: a telemetry snapshot tagged `"type": "telemetry"`.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub telemetry: Telemetry,
}

impl Frame {
    pub fn telemetry(telemetry: Telemetry) -> Self {
        Self {
            kind: "telemetry",
            telemetry,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Body returned by `POST /command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub result: String,
    pub action: String,
}

impl CommandReply {
    pub fn success(action: &str) -> Self {
        Self {
            result: "success".to_string(),
            action: action.to_string(),
        }
    }
}

/// Body returned by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub esp32: bool,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

pub struct Backend<R> {
    run_mode: RunMode,
    started: Instant,
    cpu_temp: f64,
    ultra_dist: u32,
    mode: String,
    connected_esp32: bool,
    logs: VecDeque<String>,
    counter: u64,
    rng: R,
}

impl<R: Rng> Backend<R> {
    pub fn new(run_mode: RunMode, started: Instant, rng: R) -> Self {
        let mut backend = Self {
            run_mode,
            started,
            cpu_temp: 0.0,
            ultra_dist: 0,
            mode: MODE_INITIALIZING.to_string(),
            connected_esp32: false,
            logs: VecDeque::new(),
            counter: 0,
            rng,
        };
        backend.push_log(format!("[SYS] BOOT_SEQUENCE_INIT (MODE: {run_mode})"));
        backend
    }

    /// Finish startup once the tick task is about to run.
    pub fn boot(&mut self) {
        self.push_log("[SYS] BOOT_SEQUENCE_COMPLETE");
        self.push_log(format!("[COM] LINK_ESTABLISHED: {}", self.run_mode));
        log::info!("backend booted in {} mode", self.run_mode);
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn connected_esp32(&self) -> bool {
        self.connected_esp32
    }

    pub fn logs(&self) -> &VecDeque<String> {
        &self.logs
    }

    pub fn status(&self) -> Status {
        Status {
            status: "online".to_string(),
            esp32: self.connected_esp32,
        }
    }

    /// Advance one tick and build the frame to broadcast.
    pub fn tick(&mut self, now: Instant) -> Frame {
        let mut telemetry = match self.run_mode {
            RunMode::Mock => {
                self.mock_step();
                let mut t = Telemetry::new(
                    CpuTemp::Celsius(round_tenth(self.cpu_temp)),
                    self.ultra_dist,
                    self.mode.clone(),
                );
                t.logs = self.recent(MOCK_FRAME_LOGS).cloned().collect();
                t.esp32_status = Some(ESP32_MOCK.to_string());
                t
            }
            RunMode::Live => {
                let mut t = Telemetry::new(CpuTemp::placeholder(), 0, MODE_SEARCHING);
                t.logs = self.recent(LIVE_FRAME_LOGS).cloned().collect();
                t.esp32_status = Some(ESP32_SEARCHING.to_string());
                t
            }
        };
        telemetry.uptime = format_uptime(now.saturating_duration_since(self.started));
        telemetry.run_mode = Some(self.run_mode.label().to_string());
        Frame::telemetry(telemetry)
    }

    fn mock_step(&mut self) {
        let index = ((self.counter / MOCK_DWELL_TICKS) % MOCK_PROFILES.len() as u64) as usize;
        let profile = &MOCK_PROFILES[index];

        self.connected_esp32 = true;
        let jitter = self.rng.random_range(-MOCK_JITTER_MM..=MOCK_JITTER_MM);
        self.ultra_dist = (i64::from(profile.distance_mm) + jitter).max(0) as u32;
        self.cpu_temp = profile.temp_c + self.rng.random::<f64>();
        self.mode = profile.mode.to_string();

        if self.counter % MOCK_DWELL_TICKS == 0 {
            log::debug!("mock profile {}", profile.mode);
            for line in profile.logs {
                if !self.recent(DUPLICATE_WINDOW).any(|l| l == line) {
                    self.push_log(*line);
                }
            }
        }
        self.counter += 1;
    }

    /// Apply an operator command. Unknown actions are accepted and ignored.
    pub fn apply(&mut self, command: &Command) -> Result<CommandReply, ServerError> {
        log::info!("received command: {command}");
        match command.kind() {
            Some(CommandKind::Mode) => {
                let value = required_value(command)?;
                self.mode = value.to_string();
                self.push_log(format!("[SYS] MODE_SWITCH: {value}"));
            }
            Some(CommandKind::Move) => {
                let value = required_value(command)?;
                self.push_log(format!("[COM] MOVE: {value}"));
            }
            Some(CommandKind::Terminate) => {
                self.mode = MODE_HALT.to_string();
                self.push_log("[CRT] EMERGENCY_STOP_ACTIVATED");
            }
            None => log::warn!("ignoring unknown action {:?}", command.action),
        }
        Ok(CommandReply::success(&command.action))
    }

    fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push_back(line.into());
        while self.logs.len() > LOG_CAP {
            self.logs.pop_front();
        }
    }

    fn recent(&self, n: usize) -> impl Iterator<Item = &String> {
        self.logs.iter().skip(self.logs.len().saturating_sub(n))
    }
}

fn required_value(command: &Command) -> Result<&str, ServerError> {
    command
        .value
        .as_deref()
        .ok_or_else(|| ServerError::MissingValue(command.action.clone()))
}

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomia_core::Direction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn booted(run_mode: RunMode) -> (Backend<StdRng>, Instant) {
        let start = Instant::now();
        let mut backend = Backend::new(run_mode, start, StdRng::seed_from_u64(7));
        backend.boot();
        (backend, start)
    }

    #[test]
    fn run_mode_parses_case_insensitively() {
        assert_eq!("mock".parse::<RunMode>().unwrap(), RunMode::Mock);
        assert_eq!(" LIVE ".parse::<RunMode>().unwrap(), RunMode::Live);
        assert!("serial".parse::<RunMode>().is_err());
        assert_eq!(RunMode::default(), RunMode::Live);
    }

    #[test]
    fn boot_lines_in_order() {
        let (backend, _) = booted(RunMode::Mock);
        let logs: Vec<&str> = backend.logs().iter().map(String::as_str).collect();
        assert_eq!(
            logs,
            vec![
                "[SYS] BOOT_SEQUENCE_INIT (MODE: MOCK)",
                "[SYS] BOOT_SEQUENCE_COMPLETE",
                "[COM] LINK_ESTABLISHED: MOCK",
            ]
        );
        assert_eq!(backend.mode(), MODE_INITIALIZING);
        assert!(!backend.connected_esp32());
    }

    #[test]
    fn mock_cycles_profiles_every_twenty_ticks() {
        let (mut backend, start) = booted(RunMode::Mock);
        for tick in 0..120u64 {
            let frame = backend.tick(start + Duration::from_millis(tick * 500));
            let profile = &MOCK_PROFILES[((tick / 20) % 3) as usize];
            let t = &frame.telemetry;
            assert_eq!(t.mode, profile.mode);
            let dist = i64::from(t.ultra_dist);
            assert!((dist - i64::from(profile.distance_mm)).abs() <= MOCK_JITTER_MM);
            let temp = t.cpu_temp.celsius().unwrap();
            assert!(temp >= profile.temp_c && temp <= profile.temp_c + 1.0);
            assert_eq!(t.esp32_status.as_deref(), Some(ESP32_MOCK));
            assert!(t.logs.len() <= 12);
        }
        assert!(backend.connected_esp32());
    }

    #[test]
    fn canned_lines_not_repeated_when_recent() {
        let (mut backend, start) = booted(RunMode::Mock);
        backend.tick(start);
        let count = |b: &Backend<StdRng>| {
            b.logs()
                .iter()
                .filter(|l| l.as_str() == "[SYS] PATROL_ACTIVE")
                .count()
        };
        assert_eq!(count(&backend), 1);
        // A full cycle later the patrol lines are far enough back to repeat.
        for tick in 1..=60u64 {
            backend.tick(start + Duration::from_millis(tick * 500));
        }
        assert_eq!(count(&backend), 2);
    }

    #[test]
    fn live_frames_are_offline_placeholders() {
        let (mut backend, start) = booted(RunMode::Live);
        let frame = backend.tick(start + Duration::from_secs(61));
        let t = &frame.telemetry;
        assert_eq!(t.cpu_temp, CpuTemp::placeholder());
        assert_eq!(t.ultra_dist, 0);
        assert_eq!(t.mode, MODE_SEARCHING);
        assert_eq!(t.uptime, "00:01:01");
        assert_eq!(t.run_mode.as_deref(), Some("LIVE"));
        assert_eq!(t.esp32_status.as_deref(), Some(ESP32_SEARCHING));
        assert_eq!(t.logs.len(), 3);
    }

    #[test]
    fn frame_json_carries_type_tag() {
        let (mut backend, start) = booted(RunMode::Mock);
        let json = backend.tick(start).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "telemetry");
        assert_eq!(value["run_mode"], "MOCK");
        assert_eq!(value["mode"], "PATROL");
        // The console parses the same frame, ignoring the tag.
        let parsed = Telemetry::from_frame(&json).unwrap();
        assert_eq!(parsed.mode, "PATROL");
    }

    #[test]
    fn temperature_rounded_to_one_decimal() {
        assert_eq!(round_tenth(48.96), 49.0);
        assert_eq!(round_tenth(62.14), 62.1);
    }

    #[test]
    fn commands_update_mode_and_logs() {
        let (mut backend, _) = booted(RunMode::Live);

        let reply = backend.apply(&Command::mode("AUTO")).unwrap();
        assert_eq!(reply, CommandReply::success("CMD_MODE"));
        assert_eq!(backend.mode(), "AUTO");

        backend
            .apply(&Command::movement(Direction::Left))
            .unwrap();
        backend.apply(&Command::terminate()).unwrap();
        assert_eq!(backend.mode(), MODE_HALT);

        let tail: Vec<&str> = backend.logs().iter().rev().take(3).map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "[CRT] EMERGENCY_STOP_ACTIVATED",
                "[COM] MOVE: LEFT",
                "[SYS] MODE_SWITCH: AUTO",
            ]
        );
    }

    #[test]
    fn unknown_action_is_accepted_without_effect() {
        let (mut backend, _) = booted(RunMode::Live);
        let before = backend.logs().len();
        let reply = backend.apply(&Command::new("CMD_DANCE", None)).unwrap();
        assert_eq!(reply.action, "CMD_DANCE");
        assert_eq!(backend.logs().len(), before);
    }

    #[test]
    fn mode_without_value_is_rejected() {
        let (mut backend, _) = booted(RunMode::Live);
        let err = backend.apply(&Command::new("CMD_MODE", None)).unwrap_err();
        assert!(matches!(err, ServerError::MissingValue(a) if a == "CMD_MODE"));
        assert_eq!(backend.mode(), MODE_INITIALIZING);
    }

    #[test]
    fn log_buffer_is_capped() {
        let (mut backend, _) = booted(RunMode::Live);
        for _ in 0..250 {
            backend.apply(&Command::movement(Direction::Forward)).unwrap();
        }
        assert_eq!(backend.logs().len(), LOG_CAP);
        assert!(!backend.status().esp32);
    }
}
