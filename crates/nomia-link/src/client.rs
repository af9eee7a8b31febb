//! Reconnecting telemetry socket.
//!
//! The task owns a [`LinkMachine`] and reports every transition as a
//! [`TimedEvent`] stamped when the task saw it. A failed connect, a close frame, a read error and the
//! stream simply ending are all handled the same way: emit `Disconnected`,
//! wait the fixed delay, reconnect. The task ends only when the event
//! receiver goes away or its [`LinkHandle`] is dropped.

use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use nomia_core::{LinkConfig, LinkEvent, LinkMachine, Telemetry, TimedEvent};

use crate::LinkError;

/// Owns the background link task; dropping it tears the link down,
/// including any pending reconnect.
pub struct LinkHandle {
    task: Option<JoinHandle<()>>,
}

impl LinkHandle {
    /// Whether the task has already stopped on its own.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Abort the task and wait for it to unwind.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start the link on the current tokio runtime.
pub fn spawn_link(config: LinkConfig, events: UnboundedSender<TimedEvent>) -> LinkHandle {
    LinkHandle {
        task: Some(tokio::spawn(run_link(config, events))),
    }
}

/// The link loop. Runs until `events` is closed.
pub async fn run_link(config: LinkConfig, events: UnboundedSender<TimedEvent>) {
    let url = config.ws_url();
    let mut machine = LinkMachine::new(config.reconnect_delay);

    loop {
        while !machine.should_connect(Instant::now()) {
            match machine.time_until_retry(Instant::now()) {
                Some(wait) => tokio::time::sleep(wait).await,
                None => break,
            }
        }

        machine.begin_connect();
        if !emit(&events, LinkEvent::Connecting) {
            break;
        }
        log::info!("connecting to {url} (attempt {})", machine.attempts());

        match session(&url, &mut machine, &events).await {
            Ok(true) => log::warn!("link to {url} closed"),
            Ok(false) => break,
            Err(e) => log::warn!("link to {url} failed: {e}"),
        }

        let closed = TimedEvent::now(LinkEvent::Disconnected);
        machine.on_close(closed.at);
        if events.send(closed).is_err() {
            break;
        }
        log::info!(
            "reconnecting to {url} in {}ms",
            machine.reconnect_delay().as_millis()
        );
    }

    log::debug!("link task for {url} stopped");
}

/// One connection. `Ok(true)` means the socket closed and a reconnect is
/// wanted; `Ok(false)` means nobody is listening any more.
async fn session(
    url: &str,
    machine: &mut LinkMachine,
    events: &UnboundedSender<TimedEvent>,
) -> Result<bool, LinkError> {
    let (mut stream, _) = connect_async(url).await?;

    machine.on_open();
    if !emit(events, LinkEvent::Connected) {
        return Ok(false);
    }
    log::info!("link to {url} open");

    while let Some(message) = stream.next().await {
        let delivered = match message? {
            Message::Text(text) => deliver(&text, events),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => deliver(text, events),
                Err(_) => drop_frame("binary frame is not UTF-8".to_string(), events),
            },
            Message::Close(frame) => {
                log::debug!("close frame from {url}: {frame:?}");
                break;
            }
            _ => true,
        };
        if !delivered {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Send one event stamped now. Returns false if the receiver is gone.
fn emit(events: &UnboundedSender<TimedEvent>, event: LinkEvent) -> bool {
    events.send(TimedEvent::now(event)).is_ok()
}

/// Decode one frame and forward it. Returns false if the receiver is gone.
fn deliver(text: &str, events: &UnboundedSender<TimedEvent>) -> bool {
    match Telemetry::from_frame(text) {
        Ok(telemetry) => emit(events, LinkEvent::Telemetry(telemetry)),
        Err(e) => drop_frame(e.to_string(), events),
    }
}

fn drop_frame(reason: String, events: &UnboundedSender<TimedEvent>) -> bool {
    log::warn!("dropping telemetry frame: {reason}");
    emit(events, LinkEvent::FrameDropped(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn unreachable_config() -> LinkConfig {
        LinkConfig {
            // Port 9 (discard) on loopback is refused on any normal host.
            host: "127.0.0.1".to_string(),
            port: 9,
            reconnect_delay: Duration::from_millis(50),
            ..Default::default()
        }
    }

    /// Scheduling allowance on top of the reconnect delay.
    const SLACK: Duration = Duration::from_millis(100);

    async fn next_timed(rx: &mut mpsc::UnboundedReceiver<TimedEvent>) -> Option<TimedEvent> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a link event")
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<TimedEvent>) -> Option<LinkEvent> {
        next_timed(rx).await.map(|timed| timed.event)
    }

    fn pending(rx: &mut mpsc::UnboundedReceiver<TimedEvent>) -> Option<LinkEvent> {
        rx.try_recv().ok().map(|timed| timed.event)
    }

    #[test]
    fn deliver_forwards_valid_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(deliver(
            r#"{"cpu_temp":1,"uptime":"00:00:01","ultra_dist":2,"mode":"AUTO","logs":[]}"#,
            &tx
        ));
        assert!(matches!(pending(&mut rx), Some(LinkEvent::Telemetry(t)) if t.ultra_dist == 2));
    }

    #[test]
    fn deliver_reports_malformed_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(deliver("{oops", &tx));
        assert!(matches!(pending(&mut rx), Some(LinkEvent::FrameDropped(_))));
    }

    #[test]
    fn deliver_notices_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        assert!(!deliver("{oops", &tx));
    }

    #[tokio::test]
    async fn refused_connection_is_retried_after_delay() {
        let config = unreachable_config();
        let delay = config.reconnect_delay;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_link(config, tx);

        assert_eq!(next(&mut rx).await, Some(LinkEvent::Connecting));
        for _ in 0..3 {
            let closed = next_timed(&mut rx).await.unwrap();
            assert_eq!(closed.event, LinkEvent::Disconnected);
            let retry = next_timed(&mut rx).await.unwrap();
            assert_eq!(retry.event, LinkEvent::Connecting);

            let gap = retry.at.duration_since(closed.at);
            assert!(gap >= delay, "retried after {gap:?}, before the {delay:?} delay");
            assert!(gap < delay + SLACK, "retried after {gap:?}, well past the {delay:?} delay");
        }

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn task_stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = spawn_link(unreachable_config(), tx);
        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}
