pub mod data;
pub mod live;
pub mod mock;
pub mod send;
pub mod server;
pub mod tail;

use std::time::Duration;

use nomia_core::LinkConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Link settings from the shared `--host/--port/--reconnect-ms` flags.
pub fn link_config(host: &str, port: u16, reconnect_ms: u64) -> LinkConfig {
    LinkConfig {
        host: host.to_string(),
        port,
        reconnect_delay: Duration::from_millis(reconnect_ms),
        ..Default::default()
    }
}

/// Seeded rng when `--seed` is given, OS entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Run a dashboard, reporting terminal failures the same way everywhere.
pub fn run_dashboard(mut app: crate::tui::app::App) {
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn link_config_from_flags() {
        let config = link_config("rover.local", 9000, 250);
        assert_eq!(config.ws_url(), "ws://rover.local:9000/ws");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.log_cap, LinkConfig::default().log_cap);
    }

    #[test]
    fn seeded_rngs_repeat() {
        let a: u64 = make_rng(Some(3)).random();
        let b: u64 = make_rng(Some(3)).random();
        assert_eq!(a, b);
    }
}
