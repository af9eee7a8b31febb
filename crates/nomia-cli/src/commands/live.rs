use super::{link_config, run_dashboard};
use crate::tui::app::App;

pub fn run(host: &str, port: u16, reconnect_ms: u64) {
    let config = link_config(host, port, reconnect_ms);
    match App::live(config) {
        Ok(app) => run_dashboard(app),
        Err(e) => {
            eprintln!("Error starting live link: {e}");
            std::process::exit(1);
        }
    }
}
