//! # nomia-core
//!
//! **Telemetry model for the NOMIA V1-RG rover console.**
//!
//! Three sources feed one display:
//!
//! - [`MockFeed`]: a clock-driven cycle through canned operating states
//!   (patrol, emergency halt, docking).
//! - [`DataFeed`]: sine/cosine waveforms plus noise, with a 50-sample
//!   [`HistoryBuffer`] for sparklines.
//! - [`LiveFeed`]: snapshots received from the rover backend over a socket,
//!   with an explicit reconnect state machine ([`LinkMachine`]).
//!
//! Everything here is synchronous and free of I/O; time and randomness are
//! passed in so the behavior can be tested exactly.
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Duration;
//! use nomia_core::{MockConfig, MockFeed, TelemetrySource};
//!
//! let mut feed = MockFeed::new(MockConfig::default(), rand::rng());
//! feed.tick(Duration::from_millis(5000));
//! assert_eq!(feed.telemetry().mode, "EMERGENCY_HALT");
//! ```
//!
//! ## Architecture
//!
//! Source (mock / data / live) → [`Telemetry`] snapshot (+ history) →
//! [`TelemetrySource`] → dashboard

pub mod command;
pub mod config;
pub mod display;
pub mod history;
pub mod link;
pub mod live;
pub mod mock;
pub mod sparkline;
pub mod telemetry;
pub mod uptime;
pub mod waveform;

pub use command::{Command, CommandKind, Direction};
pub use config::{DataConfig, LinkConfig, MockConfig};
pub use display::{
    TelemetrySource, distance_ratio, format_distance, format_temperature, glitch_active,
};
pub use history::{HISTORY_LEN, HistoryBuffer, Series, map_value};
pub use link::{LinkEvent, LinkMachine, LinkState, TimedEvent};
pub use live::LiveFeed;
pub use mock::{MOCK_STATES, MockFeed, MockState, state_index};
pub use sparkline::{SparklinePaths, render_svg, sparkline_paths};
pub use telemetry::{
    CpuTemp, FrameError, MODE_BOOTING, MODE_LINK_LOST, MODE_OFFLINE, Telemetry,
};
pub use uptime::{format_uptime, parse_uptime};
pub use waveform::{DataFeed, Reading, WaveformConfig, WaveformSimulator};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
