//! Runtime configuration for the telemetry sources.
//!
//! Every struct has a `Default` matching the V1-RG console's stock timings,
//! so callers override only what they need:
//!
//! ```
//! use std::time::Duration;
//! use nomia_core::config::LinkConfig;
//!
//! let config = LinkConfig {
//!     host: "rover.local".to_string(),
//!     reconnect_delay: Duration::from_millis(500),
//!     ..Default::default()
//! };
//! assert_eq!(config.ws_url(), "ws://rover.local:8080/ws");
//! ```

use std::time::Duration;

use crate::waveform::WaveformConfig;

/// Default backend port for both the socket and the command endpoint.
pub const DEFAULT_PORT: u16 = 8080;

/// Default backend host.
pub const DEFAULT_HOST: &str = "localhost";

/// Live link settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    /// Fixed wait between a close and the next connection attempt.
    pub reconnect_delay: Duration,
    /// Log lines kept from each inbound frame.
    pub log_cap: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reconnect_delay: Duration::from_millis(2000),
            log_cap: 30,
        }
    }
}

impl LinkConfig {
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/ws", self.host, self.port)
    }

    pub fn command_url(&self) -> String {
        format!("http://{}:{}/command", self.host, self.port)
    }
}

/// Mock state machine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MockConfig {
    /// Interval between snapshot updates.
    pub tick: Duration,
    /// Time spent in each mock state.
    pub dwell: Duration,
    pub log_cap: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            dwell: Duration::from_millis(5000),
            log_cap: 20,
        }
    }
}

/// Waveform ("data") source settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub tick: Duration,
    pub log_cap: usize,
    pub history_len: usize,
    pub waveform: WaveformConfig,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            log_cap: 30,
            history_len: crate::history::HISTORY_LEN,
            waveform: WaveformConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_defaults() {
        let c = LinkConfig::default();
        assert_eq!(c.ws_url(), "ws://localhost:8080/ws");
        assert_eq!(c.command_url(), "http://localhost:8080/command");
        assert_eq!(c.reconnect_delay, Duration::from_secs(2));
    }

    #[test]
    fn link_urls_follow_host_and_port() {
        let c = LinkConfig {
            host: "10.0.0.7".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(c.ws_url(), "ws://10.0.0.7:9000/ws");
        assert_eq!(c.command_url(), "http://10.0.0.7:9000/command");
    }

    #[test]
    fn feed_defaults_match_console_timings() {
        let m = MockConfig::default();
        assert_eq!(m.tick, Duration::from_millis(500));
        assert_eq!(m.dwell, Duration::from_millis(5000));
        assert_eq!(m.log_cap, 20);

        let d = DataConfig::default();
        assert_eq!(d.tick, Duration::from_millis(100));
        assert_eq!(d.log_cap, 30);
        assert_eq!(d.history_len, 50);
    }
}
