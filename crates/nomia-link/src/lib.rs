//! Live link to the V1-RG backend.
//!
//! Two halves, both async on tokio:
//!
//! - [`spawn_link`] runs the telemetry socket: connect to
//!   `ws://{host}:{port}/ws`, forward every frame as a timestamped
//!   [`LinkEvent`](nomia_core::LinkEvent), and on
//!   close wait the fixed reconnect delay and try again, forever.
//! - [`CommandClient`] posts operator commands to
//!   `http://{host}:{port}/command`, fire-and-forget.
//!
//! ```no_run
//! use nomia_core::{LinkConfig, LinkEvent};
//!
//! # async fn demo() {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let _link = nomia_link::spawn_link(LinkConfig::default(), tx);
//! while let Some(timed) = rx.recv().await {
//!     if let LinkEvent::Telemetry(t) = timed.event {
//!         println!("{} {}mm", t.mode, t.ultra_dist);
//!     }
//! }
//! # }
//! ```

pub mod client;
pub mod command;

pub use client::{LinkHandle, run_link, spawn_link};
pub use command::CommandClient;

pub use nomia_core::{LinkConfig, LinkEvent};

use thiserror::Error;

/// Errors from the socket or the command endpoint.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
    #[error("command request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("command rejected with HTTP {0}")]
    Status(reqwest::StatusCode),
}

impl From<tokio_tungstenite::tungstenite::Error> for LinkError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}
