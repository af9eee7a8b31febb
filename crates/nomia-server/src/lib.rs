//! V1-RG telemetry backend.
//!
//! Broadcasts a telemetry frame to every WebSocket client on a fixed tick
//! and accepts operator commands over HTTP. In `MOCK` mode the frames cycle
//! through canned profiles; in `LIVE` mode, with no hardware attached, they
//! report an offline snapshot.
//!
//! Endpoints: `GET /ws`, `POST /command`, `GET /status`, `GET /`.

pub mod state;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{Json, Response},
    routing::{get, post},
};
use futures_util::{SinkExt, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, broadcast};

use nomia_core::Command;
use nomia_core::config::DEFAULT_PORT;

pub use state::{Backend, CommandReply, Frame, MOCK_PROFILES, MockProfile, RunMode, Status};

/// Frames buffered per slow WebSocket client before it starts skipping.
const FRAME_BUFFER: usize = 16;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unknown run mode {0:?} (expected MOCK or LIVE)")]
    RunMode(String),
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub run_mode: RunMode,
    /// Broadcast period.
    pub tick: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            run_mode: RunMode::default(),
            tick: Duration::from_millis(500),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared server state.
pub struct AppState {
    backend: Mutex<Backend<StdRng>>,
    frames: broadcast::Sender<String>,
}

impl AppState {
    /// Fresh, booted state.
    pub fn new(run_mode: RunMode) -> Arc<Self> {
        let mut backend = Backend::new(run_mode, Instant::now(), StdRng::from_os_rng());
        backend.boot();
        let (frames, _) = broadcast::channel(FRAME_BUFFER);
        Arc::new(Self {
            backend: Mutex::new(backend),
            frames,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.frames.subscribe()
    }

    /// Advance the backend one tick and broadcast the frame. Returns the
    /// number of clients it reached.
    pub async fn tick(&self) -> usize {
        let frame = self.backend.lock().await.tick(Instant::now());
        match frame.to_json() {
            Ok(json) => self.frames.send(json).unwrap_or(0),
            Err(e) => {
                log::error!("failed to encode frame: {e}");
                0
            }
        }
    }
}

async fn run_ticker(state: Arc<AppState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        state.tick().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let frames = state.subscribe();
    ws.on_upgrade(move |socket| forward_frames(socket, frames))
}

/// Push every broadcast frame to one client. Inbound messages only keep the
/// connection alive.
async fn forward_frames(socket: WebSocket, mut frames: broadcast::Receiver<String>) {
    let (mut sink, mut inbound) = socket.split();
    log::info!("websocket client connected");
    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::debug!("websocket client lagging, skipped {n} frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = inbound.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("websocket error: {e}");
                    break;
                }
            },
        }
    }
    log::info!("websocket client disconnected");
}

async fn handle_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Result<Json<CommandReply>, (StatusCode, Json<serde_json::Value>)> {
    let mut backend = state.backend.lock().await;
    backend.apply(&command).map(Json).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "result": "error",
                "action": command.action,
                "error": e.to_string(),
            })),
        )
    })
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<Status> {
    Json(state.backend.lock().await.status())
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let run_mode = state.backend.lock().await.run_mode();
    Json(serde_json::json!({
        "name": "V1-RG Interface System",
        "version": nomia_core::VERSION,
        "run_mode": run_mode.label(),
        "endpoints": {
            "/": "This API index",
            "/ws": "WebSocket telemetry stream, one JSON frame per tick",
            "/command": {
                "method": "POST",
                "body": {"action": "CMD_MODE | CMD_MOVE | CMD_TERMINATE", "value": "mode label or FWD/BWD/LEFT/RIGHT"},
            },
            "/status": "Backend and hardware link status",
        },
    }))
}

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/ws", get(handle_ws))
        .route("/command", post(handle_command))
        .route("/status", get(handle_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(config.run_mode);
    let ticker = tokio::spawn(run_ticker(Arc::clone(&state), config.tick));
    if let Ok(addr) = listener.local_addr() {
        log::info!("serving {} telemetry on {addr}", config.run_mode);
    }

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    ticker.abort();
    Ok(result?)
}

/// Bind `config.addr()` and serve until Ctrl+C.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve(listener, config, async {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("shutting down");
    })
    .await
}
