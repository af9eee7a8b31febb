//! Clock-driven mock of the rover cycling through canned operating states.
//!
//! The active state is a pure function of elapsed session time:
//! `floor(elapsed / dwell) mod states`. A state's canned log lines are
//! appended once when it becomes active, never again until the cycle comes
//! back around.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::MockConfig;
use crate::display::TelemetrySource;
use crate::telemetry::{MODE_BOOTING, Telemetry};
use crate::uptime::format_uptime;

/// One canned operating state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockState {
    pub mode: &'static str,
    /// Target distance in millimeters.
    pub distance_mm: u32,
    /// Target CPU temperature in degrees Celsius.
    pub temp_c: u32,
    pub logs: &'static [&'static str],
}

/// The stock state cycle: patrol, emergency halt, docking.
pub const MOCK_STATES: [MockState; 3] = [
    MockState {
        mode: "PATROL_ACTIVE",
        distance_mm: 350,
        temp_c: 48,
        logs: &[
            "[SYS] PATROL_UNIT_01_ENGAGED",
            "[NAV] CALCULATING_GRID_8",
            "[SNR] OBSTACLE_CLEAR",
        ],
    },
    MockState {
        mode: "EMERGENCY_HALT",
        distance_mm: 42,
        temp_c: 65,
        logs: &[
            "[CRT] COLLISION_AVOIDANCE",
            "[SYS] EMERGENCY_STOP",
            "[SNR] DISTANCE_ALERT",
        ],
    },
    MockState {
        mode: "DOCKING_STN",
        distance_mm: 110,
        temp_c: 41,
        logs: &[
            "[NAV] DOCKING_ALIGNMENT",
            "[SYS] POWER_SYNC_READY",
            "[COM] DOCK_HANDSHAKE",
        ],
    },
];

/// Upper bound (exclusive) of the distance jitter added each tick.
pub const DISTANCE_JITTER_MM: u32 = 20;
/// Upper bound (exclusive) of the temperature jitter added each tick.
pub const TEMPERATURE_JITTER_C: u32 = 5;

/// Index of the state active `elapsed` into the session.
///
/// `states` must be non-zero; a zero `dwell` is treated as one millisecond.
pub fn state_index(elapsed: Duration, dwell: Duration, states: usize) -> usize {
    let dwell_ms = dwell.as_millis().max(1);
    ((elapsed.as_millis() / dwell_ms) % states as u128) as usize
}

/// Mock telemetry source.
pub struct MockFeed<R> {
    states: &'static [MockState],
    config: MockConfig,
    rng: R,
    telemetry: Telemetry,
    last_index: Option<usize>,
    started: Instant,
}

impl<R: Rng> MockFeed<R> {
    pub fn new(config: MockConfig, rng: R) -> Self {
        Self::with_states(&MOCK_STATES, config, rng)
    }

    /// Use a custom state table. Panics if `states` is empty.
    pub fn with_states(states: &'static [MockState], config: MockConfig, rng: R) -> Self {
        assert!(!states.is_empty(), "mock state table must not be empty");
        Self {
            states,
            config,
            rng,
            telemetry: Telemetry::new(42_u32, 250, MODE_BOOTING),
            last_index: None,
            started: Instant::now(),
        }
    }

    /// Recompute the snapshot for `elapsed` into the session.
    ///
    /// Returns `true` when this tick entered a new state.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let index = state_index(elapsed, self.config.dwell, self.states.len());
        let state = self.states[index];

        let entered = self.last_index != Some(index);
        if entered {
            for line in state.logs {
                self.telemetry.push_log(*line, self.config.log_cap);
            }
            self.last_index = Some(index);
            log::debug!("mock state -> {} (#{index})", state.mode);
        }

        let t = &mut self.telemetry;
        t.mode = state.mode.to_string();
        t.ultra_dist = state.distance_mm + self.rng.random_range(0..DISTANCE_JITTER_MM);
        t.cpu_temp = (state.temp_c + self.rng.random_range(0..TEMPERATURE_JITTER_C)).into();
        t.uptime = format_uptime(elapsed);
        entered
    }

    /// Advance using the real session clock.
    pub fn tick_now(&mut self) -> bool {
        self.tick(self.started.elapsed())
    }

    /// Index of the state applied by the most recent tick.
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    pub fn states(&self) -> &'static [MockState] {
        self.states
    }
}

impl<R> TelemetrySource for MockFeed<R> {
    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn label(&self) -> &'static str {
        "MOCK"
    }
}
