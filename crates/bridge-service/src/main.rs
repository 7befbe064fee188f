//! Disclosure Bridge
//!
//! Entry point: loads configuration, installs logging and metrics, and
//! serves the bridge API until SIGINT/SIGTERM.

use bridge_service::cli::Cli;
use bridge_service::config::Config;
use bridge_service::observability::metrics::init_metrics_recorder;
use bridge_service::routes::{self, AppState};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let json_logs = std::env::var("BRIDGE_LOG_JSON").is_ok_and(|v| v == "1");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bridge=debug,bridge_service=debug,common=info,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    info!("Starting Disclosure Bridge");

    // Load configuration
    let config = Config::load(cli.config.as_deref(), &cli.overrides()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        listen_address = %config.listen_address,
        irma_server = %config.irma_server,
        rooms = config.rooms.len(),
        default_room = config.rooms.has_default(),
        irma_max_retries = config.irma_max_retries,
        cors = config.allowed_origins.is_some(),
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    let listen_address = config.listen_address.clone();

    let state = Arc::new(AppState::from_config(config).map_err(|e| {
        error!("Failed to create application state: {}", e);
        e
    })?);

    let app = routes::build_routes(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(&listen_address)
        .await
        .map_err(|e| {
            error!("Failed to bind {}: {}", listen_address, e);
            e
        })?;

    info!("Disclosure Bridge listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Disclosure Bridge shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
