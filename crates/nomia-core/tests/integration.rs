//! Integration tests for nomia-core.
//!
//! These walk the three telemetry sources through full scenarios:
//! mock state cycling, waveform history, and a live open/message/close
//! sequence, all rendered through the shared `TelemetrySource` contract.

use std::time::{Duration, Instant};

use nomia_core::{
    CpuTemp, DataConfig, DataFeed, HISTORY_LEN, LinkConfig, LinkEvent, LiveFeed, MODE_LINK_LOST,
    MockConfig, MockFeed, Series, Telemetry, TelemetrySource, format_distance,
    format_temperature, state_index,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Render the fields the dashboard shows, the same way for every source.
fn rendered(source: &dyn TelemetrySource) -> (String, String, String, String, Vec<String>) {
    let t = source.telemetry();
    (
        format_temperature(&t.cpu_temp),
        t.uptime.clone(),
        format_distance(t.ultra_dist),
        t.mode.clone(),
        t.logs.iter().cloned().collect(),
    )
}

#[test]
fn mock_transitions_once_at_five_seconds_with_three_new_lines() {
    let mut feed = MockFeed::new(MockConfig::default(), StdRng::seed_from_u64(1));

    let mut transitions = 0;
    let mut lines_before = 0;
    let mut last_mode = String::new();
    // Ticks every 500 ms from mount up to and including 5000 ms.
    for t in (0..=5000).step_by(500) {
        let before = feed.telemetry().logs.len();
        let entered = feed.tick(ms(t));
        let mode = feed.telemetry().mode.clone();
        if t > 0 && entered {
            transitions += 1;
            lines_before = before;
            assert_eq!(t, 5000, "transition should happen exactly at 5000 ms");
            assert_eq!(last_mode, "PATROL_ACTIVE");
            assert_eq!(mode, "EMERGENCY_HALT");
        }
        last_mode = mode;
    }

    assert_eq!(transitions, 1);
    let logs = &feed.telemetry().logs;
    assert_eq!(logs.len(), lines_before + 3);
    let tail: Vec<&str> = logs.iter().skip(lines_before).map(String::as_str).collect();
    assert_eq!(
        tail,
        vec![
            "[CRT] COLLISION_AVOIDANCE",
            "[SYS] EMERGENCY_STOP",
            "[SNR] DISTANCE_ALERT"
        ]
    );
}

#[test]
fn mock_state_index_matches_formula_and_logs_once_per_visit() {
    let mut feed = MockFeed::new(MockConfig::default(), StdRng::seed_from_u64(2));
    let mut visits = 0;
    for t in (0..60_000).step_by(500) {
        let entered = feed.tick(ms(t));
        assert_eq!(feed.last_index(), Some(((t / 5000) % 3) as usize));
        assert_eq!(state_index(ms(t), ms(5000), 3), ((t / 5000) % 3) as usize);
        if entered {
            visits += 1;
        }
    }
    // 60 s / 5 s dwell = 12 visits.
    assert_eq!(visits, 12);
    assert!(feed.telemetry().logs.len() <= 20);
}

#[test]
fn data_feed_never_goes_negative_and_history_slides() {
    let mut feed = DataFeed::new(DataConfig::default(), StdRng::seed_from_u64(9));
    let start = 1_760_000_000.0;
    for i in 0..3000u64 {
        let reading = feed.tick(start + i as f64 * 0.1, ms(i * 100));
        assert_eq!(feed.telemetry().ultra_dist, reading.distance_mm);
        assert!(feed.telemetry().cpu_temp.celsius().unwrap() >= 0.0);
        assert!(feed.telemetry().logs.len() <= 30);

        let history = feed.history().unwrap();
        assert_eq!(history.series(Series::Distance).len(), HISTORY_LEN);
        assert_eq!(
            *history.series(Series::Temperature).back().unwrap(),
            Series::Temperature.map(f64::from(reading.temp_c))
        );
    }
}

#[test]
fn live_scenario_frame_is_displayed_verbatim() {
    let mut feed = LiveFeed::new(&LinkConfig::default());
    let now = Instant::now();
    feed.apply(LinkEvent::Connecting, now);
    feed.apply(LinkEvent::Connected, now);

    let frame = Telemetry::from_frame(
        r#"{"cpu_temp":50,"uptime":"00:01:00","ultra_dist":120,"mode":"AUTO","logs":["a"]}"#,
    )
    .unwrap();
    feed.apply(LinkEvent::Telemetry(frame), now);

    let (temp, uptime, dist, mode, logs) = rendered(&feed);
    assert_eq!(temp, "50°C");
    assert_eq!(uptime, "00:01:00");
    assert_eq!(dist, "120mm");
    assert_eq!(mode, "AUTO");
    assert_eq!(logs, vec!["a".to_string()]);
}

#[test]
fn live_open_message_close_sets_sentinel_and_schedules_retry() {
    let config = LinkConfig {
        reconnect_delay: ms(2000),
        ..Default::default()
    };
    let mut feed = LiveFeed::new(&config);
    let t0 = Instant::now();
    feed.apply(LinkEvent::Connecting, t0);
    feed.apply(LinkEvent::Connected, t0);
    assert_eq!(feed.connected(), Some(true));

    let frame = Telemetry::new(CpuTemp::Celsius(47.0), 300, "AUTO");
    feed.apply(LinkEvent::Telemetry(frame), t0 + ms(10));

    let closed_at = t0 + ms(20);
    feed.apply(LinkEvent::Disconnected, closed_at);
    assert_eq!(feed.telemetry().mode, MODE_LINK_LOST);
    assert_eq!(feed.connected(), Some(false));

    let link = feed.link();
    assert!(!link.should_connect(closed_at + ms(1999)));
    assert!(link.should_connect(closed_at + ms(2000)));
}

#[test]
fn malformed_frame_is_dropped_without_touching_display() {
    let mut feed = LiveFeed::new(&LinkConfig::default());
    let now = Instant::now();
    let good = Telemetry::from_frame(
        r#"{"cpu_temp":40,"uptime":"00:00:05","ultra_dist":80,"mode":"MANUAL","logs":[]}"#,
    )
    .unwrap();
    feed.apply(LinkEvent::Telemetry(good.clone()), now);

    match Telemetry::from_frame(r#"{"cpu_temp":40,"uptime":"#) {
        Ok(_) => panic!("truncated frame should not parse"),
        Err(e) => feed.apply(LinkEvent::FrameDropped(e.to_string()), now),
    }
    assert_eq!(feed.telemetry(), &good);
    assert_eq!(feed.dropped(), 1);
}

#[test]
fn every_source_renders_through_the_same_contract() {
    let mut mock = MockFeed::new(MockConfig::default(), StdRng::seed_from_u64(3));
    mock.tick(ms(0));
    let mut data = DataFeed::new(DataConfig::default(), StdRng::seed_from_u64(3));
    data.tick(0.0, ms(0));
    let live = LiveFeed::new(&LinkConfig::default());

    let sources: Vec<&dyn TelemetrySource> = vec![&mock, &data, &live];
    let labels: Vec<&str> = sources.iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["MOCK", "DATA", "LIVE"]);
    for s in sources {
        let (temp, _, dist, _, _) = rendered(s);
        assert!(temp.ends_with("°C"));
        assert!(dist.ends_with("mm"));
    }
}
