//! RAX static server - Entry Point
//!
//! Serves a project directory over HTTP with filesystem access restrictions.
//! Usage: `rax-static-server [config-path]` (defaults to `config.toml`).

use log::{error, info};

use rax_static_server::Server;
use rax_static_server::config::ServerConfig;
use rax_static_server::utils::setup_logging;

#[tokio::main]
async fn main() {
    setup_logging();

    info!("Launching static file server...");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let config = match ServerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    server.start().await;
}
