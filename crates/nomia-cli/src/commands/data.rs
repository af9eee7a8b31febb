use std::path::PathBuf;
use std::time::Duration;

use nomia_core::DataConfig;

use super::{make_rng, run_dashboard};
use crate::tui::app::App;

pub fn run(tick_ms: u64, seed: Option<u64>, export_dir: &str) {
    let config = DataConfig {
        tick: Duration::from_millis(tick_ms.max(1)),
        ..Default::default()
    };
    run_dashboard(App::data(config, make_rng(seed), PathBuf::from(export_dir)));
}
