//! nomia: terminal console for the NOMIA V1-RG rover.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nomia")]
#[command(about = "nomia: telemetry console for the V1-RG rover")]
#[command(version = nomia_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard fed by the backend's WebSocket, with operator controls
    Live {
        /// Backend host
        #[arg(long, env = "NOMIA_HOST", default_value = "localhost")]
        host: String,

        /// Backend port
        #[arg(long, env = "NOMIA_PORT", default_value = "8080")]
        port: u16,

        /// Wait between a lost link and the next attempt
        #[arg(long, default_value = "2000")]
        reconnect_ms: u64,
    },

    /// Mock dashboard: canned operating states, switching every dwell period
    Mock {
        /// Display refresh period
        #[arg(long, default_value = "500")]
        tick_ms: u64,

        /// Time spent in each state
        #[arg(long, default_value = "5000")]
        dwell_ms: u64,

        /// Seed for reproducible jitter
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Data dashboard: simulated waveforms with sparkline history.
    /// Press `e` to export the history as SVG.
    Data {
        /// Sample period
        #[arg(long, default_value = "100")]
        tick_ms: u64,

        /// Seed for reproducible noise
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for SVG snapshots
        #[arg(long, default_value = ".")]
        export_dir: String,
    },

    /// Print live telemetry frames as JSON lines, reconnecting as needed
    Tail {
        #[arg(long, env = "NOMIA_HOST", default_value = "localhost")]
        host: String,

        #[arg(long, env = "NOMIA_PORT", default_value = "8080")]
        port: u16,

        #[arg(long, default_value = "2000")]
        reconnect_ms: u64,

        /// Stop after this many frames
        #[arg(long)]
        count: Option<usize>,
    },

    /// Send one operator command to the backend
    Send {
        #[arg(long, env = "NOMIA_HOST", default_value = "localhost")]
        host: String,

        #[arg(long, env = "NOMIA_PORT", default_value = "8080")]
        port: u16,

        /// Command to send
        #[arg(value_parser = ["mode", "move", "terminate", "stop"])]
        action: String,

        /// Mode label (MANUAL, AUTO, DOCKING) or direction (w/a/s/d, fwd/bwd/left/right)
        value: Option<String>,
    },

    /// Run the telemetry backend (WebSocket broadcast + command endpoint)
    Server {
        /// Port to listen on
        #[arg(long, env = "NOMIA_PORT", default_value = "8080")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// MOCK cycles canned profiles; LIVE reports an offline rover
        #[arg(long, env = "V1RG_MODE", default_value = "LIVE")]
        mode: String,

        /// Broadcast period
        #[arg(long, default_value = "500")]
        tick_ms: u64,
    },
}

impl Commands {
    /// Default log filter when `RUST_LOG` is unset. Full-screen dashboards
    /// stay quiet so stderr does not tear the alternate screen.
    fn default_log_level(&self) -> &'static str {
        match self {
            Self::Live { .. } | Self::Mock { .. } | Self::Data { .. } => "off",
            Self::Tail { .. } | Self::Send { .. } | Self::Server { .. } => "info",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.command.default_log_level()),
    )
    .init();

    match cli.command {
        Commands::Live {
            host,
            port,
            reconnect_ms,
        } => commands::live::run(&host, port, reconnect_ms),
        Commands::Mock {
            tick_ms,
            dwell_ms,
            seed,
        } => commands::mock::run(tick_ms, dwell_ms, seed),
        Commands::Data {
            tick_ms,
            seed,
            export_dir,
        } => commands::data::run(tick_ms, seed, &export_dir),
        Commands::Tail {
            host,
            port,
            reconnect_ms,
            count,
        } => commands::tail::run(&host, port, reconnect_ms, count),
        Commands::Send {
            host,
            port,
            action,
            value,
        } => commands::send::run(&host, port, &action, value.as_deref()),
        Commands::Server {
            port,
            host,
            mode,
            tick_ms,
        } => commands::server::run(&host, port, &mode, tick_ms),
    }
}
