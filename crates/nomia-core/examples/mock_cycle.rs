//! Walk the mock state machine through one full cycle and print each state
//! change with the log lines it emitted.
//!
//! Run: `cargo run --example mock_cycle`

use std::time::Duration;

use nomia_core::{MockConfig, MockFeed, TelemetrySource, format_distance, format_temperature};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() {
    let config = MockConfig::default();
    let (tick, dwell) = (config.tick, config.dwell);
    let mut feed = MockFeed::new(config, StdRng::seed_from_u64(7));

    let cycle = dwell * feed.states().len() as u32;
    let mut elapsed = Duration::ZERO;
    while elapsed < cycle {
        let before = feed.telemetry().logs.len();
        if feed.tick(elapsed) {
            let t = feed.telemetry();
            println!(
                "[{}] {:<15} {:>6} {:>6}",
                t.uptime,
                t.mode,
                format_temperature(&t.cpu_temp),
                format_distance(t.ultra_dist)
            );
            for line in t.logs.iter().skip(before) {
                println!("           {line}");
            }
        }
        elapsed += tick;
    }
}
