//! Headless live feed: one JSON line per telemetry frame on stdout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nomia_core::LinkEvent;
use nomia_link::spawn_link;
use tokio::sync::mpsc;

use super::link_config;

/// How often the Ctrl+C flag is checked while no event arrives.
const POLL: Duration = Duration::from_millis(200);

pub fn run(host: &str, port: u16, reconnect_ms: u64, count: Option<usize>) {
    let config = link_config(host, port, reconnect_ms);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Error setting Ctrl+C handler: {e}");
        std::process::exit(1);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };

    let printed = rt.block_on(async {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = spawn_link(config, tx);
        let mut printed = 0usize;

        while running.load(Ordering::SeqCst) && count.is_none_or(|n| printed < n) {
            let event = match tokio::time::timeout(POLL, rx.recv()).await {
                Ok(Some(timed)) => timed.event,
                Ok(None) => break,
                Err(_) => continue,
            };
            if let Some(line) = frame_line(&event) {
                println!("{line}");
                printed += 1;
            }
        }

        link.shutdown().await;
        printed
    });
    log::info!("{printed} frames received");
}

/// The stdout line for an event: telemetry frames only. Link transitions go
/// to the log.
pub fn frame_line(event: &LinkEvent) -> Option<String> {
    match event {
        LinkEvent::Telemetry(t) => match serde_json::to_string(t) {
            Ok(line) => Some(line),
            Err(e) => {
                log::warn!("cannot encode frame: {e}");
                None
            }
        },
        LinkEvent::FrameDropped(reason) => {
            log::warn!("frame dropped: {reason}");
            None
        }
        other => {
            log::info!("link: {other:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomia_core::Telemetry;

    #[test]
    fn telemetry_becomes_one_json_line() {
        let frame =
            r#"{"cpu_temp":50,"uptime":"00:01:00","ultra_dist":120,"mode":"AUTO","logs":["a"]}"#;
        let t = Telemetry::from_frame(frame).unwrap();
        let line = frame_line(&LinkEvent::Telemetry(t.clone())).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(Telemetry::from_frame(&line).unwrap(), t);
    }

    #[test]
    fn link_events_are_not_printed() {
        assert_eq!(frame_line(&LinkEvent::Connected), None);
        assert_eq!(frame_line(&LinkEvent::Disconnected), None);
        assert_eq!(frame_line(&LinkEvent::FrameDropped("bad".into())), None);
    }
}
