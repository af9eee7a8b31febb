//! TUI application state and event loop.
//!
//! One `App` drives any of the three feeds. Mock and data feeds tick on the
//! UI thread. The live feed's socket runs on a private tokio runtime and its
//! events are drained here once per frame, so display state is only ever
//! touched from this thread.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::rngs::StdRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use nomia_core::command::{MODE_AUTO, MODE_DOCKING, MODE_MANUAL};
use nomia_core::waveform::wall_clock_secs;
use nomia_core::{
    Command, DataConfig, DataFeed, Direction, HistoryBuffer, LinkConfig, LinkState, LiveFeed,
    MockConfig, MockFeed, TelemetrySource, TimedEvent, glitch_active, render_svg,
};
use nomia_link::{CommandClient, LinkHandle, spawn_link};

// ---------------------------------------------------------------------------
// Live session
// ---------------------------------------------------------------------------

/// The live feed plus the async machinery behind it.
pub struct LiveSession {
    feed: LiveFeed,
    events: UnboundedReceiver<TimedEvent>,
    commands: CommandClient,
    // Declared before the runtime: the link task is aborted before the
    // runtime shuts down.
    _link: LinkHandle,
    runtime: Runtime,
}

impl LiveSession {
    pub fn start(config: LinkConfig) -> io::Result<Self> {
        let runtime = Runtime::new()?;
        let (tx, events) = mpsc::unbounded_channel();
        let link = {
            let _guard = runtime.enter();
            spawn_link(config.clone(), tx)
        };
        log::info!("live link to {}", config.ws_url());
        Ok(Self {
            feed: LiveFeed::new(&config),
            events,
            commands: CommandClient::new(&config),
            _link: link,
            runtime,
        })
    }

    /// Apply every event delivered since the last call, each at the time
    /// the link task observed it.
    fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(timed) = self.events.try_recv() {
            self.feed.apply_timed(timed);
            applied += 1;
        }
        applied
    }

    fn send(&self, command: Command) {
        let _guard = self.runtime.enter();
        // Detached; failures are logged by the client.
        drop(self.commands.dispatch(command));
    }

    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

pub enum Feed {
    Mock(MockFeed<StdRng>),
    Data(DataFeed<StdRng>),
    Live(Box<LiveSession>),
}

impl Feed {
    pub fn source(&self) -> &dyn TelemetrySource {
        match self {
            Self::Mock(feed) => feed,
            Self::Data(feed) => feed,
            Self::Live(session) => &session.feed,
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    feed: Feed,
    /// Local tick period; `None` for the live feed, which is event driven.
    tick: Option<Duration>,
    export_dir: PathBuf,
    started: Instant,
    last_tick: Instant,
    running: bool,
    show_logs: bool,
    /// Last operator-facing message (command sent, snapshot written).
    status: Option<String>,
}

impl App {
    fn new(feed: Feed, tick: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            feed,
            tick,
            export_dir: PathBuf::from("."),
            started: now,
            last_tick: now,
            running: true,
            show_logs: true,
            status: None,
        }
    }

    pub fn mock(config: MockConfig, rng: StdRng) -> Self {
        let tick = config.tick;
        Self::new(Feed::Mock(MockFeed::new(config, rng)), Some(tick))
    }

    pub fn data(config: DataConfig, rng: StdRng, export_dir: PathBuf) -> Self {
        let tick = config.tick;
        let mut app = Self::new(Feed::Data(DataFeed::new(config, rng)), Some(tick));
        app.export_dir = export_dir;
        app
    }

    pub fn live(config: LinkConfig) -> io::Result<Self> {
        let session = LiveSession::start(config)?;
        Ok(Self::new(Feed::Live(Box::new(session)), None))
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before the panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            self.update(Instant::now());
            terminal.draw(|f| super::ui::draw(f, self, Instant::now()))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }

        Ok(())
    }

    /// Advance local feeds whose tick is due and drain link events.
    pub fn update(&mut self, now: Instant) {
        let due = self
            .tick
            .is_some_and(|tick| now.saturating_duration_since(self.last_tick) >= tick);
        if due {
            self.last_tick = now;
        }
        let elapsed = now.saturating_duration_since(self.started);

        match &mut self.feed {
            Feed::Mock(feed) if due => {
                feed.tick(elapsed);
            }
            Feed::Data(feed) if due => {
                feed.tick(wall_clock_secs(), elapsed);
            }
            Feed::Live(session) => {
                session.drain();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('l') => self.show_logs = !self.show_logs,
            KeyCode::Char('e') if matches!(self.feed, Feed::Data(_)) => self.export_snapshot(),
            KeyCode::Char(c) if matches!(self.feed, Feed::Live(_)) => self.live_key(c),
            _ => {}
        }
    }

    fn live_key(&mut self, key: char) {
        let command = match key {
            '1' => Command::mode(MODE_MANUAL),
            '2' => Command::mode(MODE_AUTO),
            '3' => Command::mode(MODE_DOCKING),
            'x' | 'X' => Command::terminate(),
            _ => match Direction::from_key(key) {
                Some(direction) => Command::movement(direction),
                None => return,
            },
        };
        if let Feed::Live(session) = &self.feed {
            self.status = Some(format!("sent {command}"));
            session.send(command);
        }
    }

    fn export_snapshot(&mut self) {
        let Some(history) = self.feed.source().history() else {
            return;
        };
        self.status = Some(match export_history(&self.export_dir, history) {
            Ok(path) => format!("saved {}", path.display()),
            Err(e) => {
                log::warn!("snapshot export failed: {e}");
                format!("export failed: {e}")
            }
        });
    }

    // --- Accessors for the renderer ---

    pub fn source(&self) -> &dyn TelemetrySource {
        self.feed.source()
    }

    pub fn link_state(&self) -> Option<LinkState> {
        match &self.feed {
            Feed::Live(session) => Some(session.feed().link_state()),
            _ => None,
        }
    }

    /// `(frames applied, frames dropped)` for the live feed.
    pub fn frame_counts(&self) -> Option<(u64, u64)> {
        match &self.feed {
            Feed::Live(session) => Some((session.feed().frames(), session.feed().dropped())),
            _ => None,
        }
    }

    pub fn show_logs(&self) -> bool {
        self.show_logs
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether the lost-link flicker is showing at `now`.
    pub fn glitch(&self, now: Instant) -> bool {
        self.source()
            .connected()
            .is_some_and(|c| glitch_active(c, now.saturating_duration_since(self.started)))
    }

    pub fn key_hint(&self) -> &'static str {
        match self.feed {
            Feed::Mock(_) => " l: logs   q: quit",
            Feed::Data(_) => " e: export svg   l: logs   q: quit",
            Feed::Live(_) => {
                " wasd: move   1 manual  2 auto  3 docking   x: terminate   l: logs   q: quit"
            }
        }
    }
}

/// Write the history sparklines as an SVG file in `dir`.
pub fn export_history(dir: &Path, history: &HistoryBuffer) -> io::Result<PathBuf> {
    let millis = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let path = dir.join(format!("nomia-history-{millis}.svg"));
    std::fs::write(&path, render_svg(history))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn mock_app() -> App {
        App::mock(MockConfig::default(), StdRng::seed_from_u64(5))
    }

    #[test]
    fn mock_ticks_on_schedule() {
        let mut app = mock_app();
        let t0 = app.started;

        app.update(t0 + ms(100));
        assert_eq!(app.source().telemetry().mode, "BOOTING");

        app.update(t0 + ms(500));
        assert_eq!(app.source().telemetry().mode, "PATROL_ACTIVE");

        app.update(t0 + ms(5000));
        assert_eq!(app.source().telemetry().mode, "EMERGENCY_HALT");
        assert_eq!(app.source().telemetry().uptime, "00:00:05");
    }

    #[test]
    fn keys_toggle_logs_and_quit() {
        let mut app = mock_app();
        assert!(app.show_logs());
        app.handle_key(KeyCode::Char('l'));
        assert!(!app.show_logs());
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.status(), None);
        app.handle_key(KeyCode::Esc);
        assert!(!app.running);
    }

    #[test]
    fn local_feeds_never_glitch() {
        let app = mock_app();
        assert!(!app.glitch(app.started));
        assert_eq!(app.link_state(), None);
        assert_eq!(app.frame_counts(), None);
    }

    #[test]
    fn data_export_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::data(
            DataConfig::default(),
            StdRng::seed_from_u64(6),
            dir.path().to_path_buf(),
        );
        let t0 = app.started;
        for i in 1..=10 {
            app.update(t0 + ms(i * 100));
        }
        assert_eq!(app.source().telemetry().logs.len(), 10);

        app.handle_key(KeyCode::Char('e'));
        let status = app.status().unwrap();
        assert!(status.starts_with("saved "), "{status}");

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let svg = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<path").count(), 4);
    }

    #[test]
    fn export_into_missing_dir_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(export_history(&missing, &HistoryBuffer::default()).is_err());
    }

    #[test]
    fn live_unreachable_backend_shows_link_lost() {
        let config = LinkConfig {
            host: "127.0.0.1".to_string(),
            port: 9,
            reconnect_delay: ms(50),
            ..Default::default()
        };
        let mut app = App::live(config).unwrap();
        assert_eq!(app.source().telemetry().mode, "OFFLINE");

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.source().telemetry().mode != "LINK_LOST" && Instant::now() < deadline {
            std::thread::sleep(ms(10));
            app.update(Instant::now());
        }
        assert_eq!(app.source().telemetry().mode, "LINK_LOST");
        assert_eq!(app.source().connected(), Some(false));
        if let Feed::Live(session) = &app.feed {
            // Armed from the link task's close stamp, not from the drain.
            let retry_at = session.feed().link().retry_at().unwrap();
            assert!(retry_at <= Instant::now() + ms(50));
        }

        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.status(), Some("sent CMD_MODE -> AUTO"));
        app.handle_key(KeyCode::Char('w'));
        assert_eq!(app.status(), Some("sent CMD_MOVE -> FWD"));
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.status(), Some("sent CMD_MOVE -> FWD"));
    }
}
