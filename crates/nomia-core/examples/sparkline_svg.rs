//! Run the waveform simulator for a few seconds and write the sparkline
//! history as SVG to stdout.
//!
//! Run: `cargo run --example sparkline_svg > history.svg`

use nomia_core::{DataConfig, DataFeed, TelemetrySource, render_svg};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() {
    let config = DataConfig::default();
    let tick = config.tick;
    let mut feed = DataFeed::new(config, StdRng::seed_from_u64(11));

    // 80 samples at 100 ms: the 50-sample window has fully slid.
    let start = 1_700_000_000.0;
    for i in 0..80u32 {
        let elapsed = tick * i;
        feed.tick(start + elapsed.as_secs_f64(), elapsed);
    }

    if let Some(history) = feed.history() {
        print!("{}", render_svg(history));
    }
    eprintln!("last: {}", feed.telemetry().logs.back().map_or("", String::as_str));
}
