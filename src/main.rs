use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use trego_gateway::config::load_config;
use trego_gateway::http::HttpServer;
use trego_gateway::lifecycle::{self, signals, Shutdown};
use trego_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "trego-gateway")]
#[command(about = "API gateway for the Trego pickup-game platform", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults and environment variables apply without one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    if cli.check_config {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init(&config.observability);
    tracing::info!(build_version = %config.build_version, "trego-gateway starting");

    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.server.bind_address.clone();
    let shutdown = Shutdown::new();
    let state = lifecycle::initialize(config, &shutdown).await?;
    let store = state.store_health.clone();

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(state);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
