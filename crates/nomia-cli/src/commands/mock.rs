use std::time::Duration;

use nomia_core::MockConfig;

use super::{make_rng, run_dashboard};
use crate::tui::app::App;

pub fn run(tick_ms: u64, dwell_ms: u64, seed: Option<u64>) {
    let config = MockConfig {
        tick: Duration::from_millis(tick_ms.max(1)),
        dwell: Duration::from_millis(dwell_ms),
        ..Default::default()
    };
    run_dashboard(App::mock(config, make_rng(seed)));
}
