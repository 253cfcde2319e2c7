use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gameverse::config::{load_config, AppConfig};
use gameverse::http::HttpServer;
use gameverse::lifecycle::{wait_for_signal, Shutdown};
use gameverse::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gameverse")]
#[command(about = "GameVerse API server", long_about = None)]
struct Args {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("gameverse v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = ?config.store.backend,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.admin.api_key == AppConfig::default().admin.api_key {
        tracing::warn!("Admin API key is the built-in placeholder; set admin.api_key");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config).await?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
