//! Forum pretty-URL router.
//!
//! Serves the forum entry point behind request normalization: legacy links
//! are redirected, malformed queries rejected, and HTML output rewritten to
//! pretty routes.
//!
//! Usage: `pretty-router [config.toml]`

use std::path::PathBuf;

use tokio::net::TcpListener;

use pretty_router::config::{load_config, RouterConfig};
use pretty_router::observability::{logging, metrics};
use pretty_router::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init_tracing(Some(config.observability.log_level.as_str()));

    tracing::info!("pretty-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = ?config_path,
        bind_address = %config.listener.bind_address,
        base_url = %config.site.base_url,
        separator = config.site.argument_separator.as_str(),
        pretty_urls = config.site.pretty_urls,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
