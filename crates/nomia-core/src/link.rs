//! Connection state of the live telemetry link.
//!
//! ```text
//!              begin_connect            on_open
//! Disconnected ────────────▶ Connecting ───────▶ Connected
//!      ▲                         │                   │
//!      └──────── on_close ───────┴───────────────────┘
//! ```
//!
//! `on_close` arms a retry deadline `reconnect_delay` in the future; the only
//! way out of `Disconnected` is that deadline passing. Retries are unbounded
//! and the delay never grows.

use std::time::{Duration, Instant};

use crate::telemetry::Telemetry;

/// Observable link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }
}

/// Events emitted by a link driver.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A connection attempt has started.
    Connecting,
    /// The socket is open.
    Connected,
    /// A valid frame arrived.
    Telemetry(Telemetry),
    /// A frame was rejected; carries the reason.
    FrameDropped(String),
    /// The socket closed, failed to open, or errored.
    Disconnected,
}

/// A [`LinkEvent`] stamped with the moment the driver observed it, so a
/// consumer that applies events later still mirrors the driver's timers.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub at: Instant,
    pub event: LinkEvent,
}

impl TimedEvent {
    pub fn now(event: LinkEvent) -> Self {
        Self {
            at: Instant::now(),
            event,
        }
    }
}

/// Reconnect-on-close state machine.
#[derive(Debug, Clone)]
pub struct LinkMachine {
    state: LinkState,
    reconnect_delay: Duration,
    retry_at: Option<Instant>,
    attempts: u64,
}

impl LinkMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: LinkState::Disconnected,
            reconnect_delay,
            retry_at: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// When the next attempt is due, if one is armed.
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Whether a driver should start a connection attempt at `now`.
    pub fn should_connect(&self, now: Instant) -> bool {
        match (self.state, self.retry_at) {
            (LinkState::Disconnected, None) => true,
            (LinkState::Disconnected, Some(at)) => now >= at,
            _ => false,
        }
    }

    /// How long a driver has to wait before the next attempt.
    pub fn time_until_retry(&self, now: Instant) -> Option<Duration> {
        match self.state {
            LinkState::Disconnected => {
                Some(self.retry_at.map_or(Duration::ZERO, |at| at.saturating_duration_since(now)))
            }
            _ => None,
        }
    }

    pub fn begin_connect(&mut self) {
        self.state = LinkState::Connecting;
        self.retry_at = None;
        self.attempts += 1;
    }

    pub fn on_open(&mut self) {
        self.state = LinkState::Connected;
        self.retry_at = None;
    }

    /// Close, failed open and socket errors all land here.
    pub fn on_close(&mut self, now: Instant) {
        self.state = LinkState::Disconnected;
        self.retry_at = Some(now + self.reconnect_delay);
    }
}
