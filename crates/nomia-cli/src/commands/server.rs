use std::time::Duration;

use nomia_server::{RunMode, ServerConfig};

pub fn run(host: &str, port: u16, mode: &str, tick_ms: u64) {
    let run_mode: RunMode = match mode.parse() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let config = ServerConfig {
        host: host.to_string(),
        port,
        run_mode,
        tick: Duration::from_millis(tick_ms.max(1)),
    };

    let base = format!("http://{host}:{port}");
    println!("V1-RG Interface System v{}", nomia_core::VERSION);
    println!("   {base}");
    println!("   run mode: {run_mode}");
    println!();
    println!("   Endpoints:");
    println!("     GET  /         API index (try: curl {base})");
    println!("     GET  /ws       Telemetry stream, one frame every {tick_ms}ms");
    println!("     POST /command  {{\"action\": \"CMD_MODE\", \"value\": \"AUTO\"}}");
    println!("     GET  /status   Backend and hardware link status");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(nomia_server::run_server(config)) {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
