//! Display-side state of the live source.
//!
//! A [`LiveFeed`] consumes [`LinkEvent`]s from whatever drives the socket and
//! keeps the snapshot, history and link state the dashboard renders. It does
//! no I/O, so it can be driven from tests with hand-built events.

use std::time::{Duration, Instant};

use crate::config::LinkConfig;
use crate::display::TelemetrySource;
use crate::history::HistoryBuffer;
use crate::link::{LinkEvent, LinkMachine, LinkState, TimedEvent};
use crate::telemetry::{MODE_LINK_LOST, Telemetry};

/// Live telemetry as seen by the display.
pub struct LiveFeed {
    telemetry: Telemetry,
    history: HistoryBuffer,
    link: LinkMachine,
    log_cap: usize,
    frames: u64,
    dropped: u64,
    last_frame: Option<Instant>,
}

impl LiveFeed {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            telemetry: Telemetry::offline(),
            history: HistoryBuffer::default(),
            link: LinkMachine::new(config.reconnect_delay),
            log_cap: config.log_cap,
            frames: 0,
            dropped: 0,
            last_frame: None,
        }
    }

    /// Apply one link event observed at `now`.
    pub fn apply(&mut self, event: LinkEvent, now: Instant) {
        match event {
            LinkEvent::Connecting => self.link.begin_connect(),
            LinkEvent::Connected => self.link.on_open(),
            LinkEvent::Telemetry(mut telemetry) => {
                telemetry.clamp_logs(self.log_cap);
                if let Some(c) = telemetry.cpu_temp.celsius() {
                    self.history.push(f64::from(telemetry.ultra_dist), c);
                }
                self.telemetry = telemetry;
                self.frames += 1;
                self.last_frame = Some(now);
            }
            LinkEvent::FrameDropped(reason) => {
                self.dropped += 1;
                log::debug!("live frame dropped: {reason}");
            }
            LinkEvent::Disconnected => {
                self.link.on_close(now);
                self.telemetry.mode = MODE_LINK_LOST.to_string();
            }
        }
    }

    /// Apply an event at the time the driver saw it, not the time it was
    /// dequeued.
    pub fn apply_timed(&mut self, timed: TimedEvent) {
        self.apply(timed.event, timed.at);
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn link(&self) -> &LinkMachine {
        &self.link
    }

    /// Frames applied so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames rejected so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Time since the last applied frame.
    pub fn since_last_frame(&self, now: Instant) -> Option<Duration> {
        self.last_frame.map(|t| now.saturating_duration_since(t))
    }
}

impl TelemetrySource for LiveFeed {
    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn history(&self) -> Option<&HistoryBuffer> {
        Some(&self.history)
    }

    fn connected(&self) -> Option<bool> {
        Some(self.link.is_connected())
    }

    fn label(&self) -> &'static str {
        "LIVE"
    }
}
