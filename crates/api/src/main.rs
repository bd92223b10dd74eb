use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartsense_api::background::link::LinkExit;
use smartsense_api::config::ServerConfig;
use smartsense_api::router::build_app_router;
use smartsense_api::state::AppState;
use smartsense_api::{background, ws};
use smartsense_link::config::LinkConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "smartsense_api=debug,smartsense_link=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let link_config = LinkConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        danger_gas_ppm = config.thresholds.danger_gas_ppm(),
        "Loaded server configuration"
    );

    // --- App state ---
    let state = AppState::new(config.clone());
    let hub = Arc::clone(&state.hub);

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&hub));

    // --- Serial link ---
    let link_cancel = CancellationToken::new();
    let link_handle = background::link::spawn(
        link_config,
        Arc::clone(&state.gateway),
        link_cancel.clone(),
    );

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Some(handle) = link_handle {
        match background::link::stop(handle, &link_cancel, Duration::from_secs(5)).await {
            LinkExit::Stopped => tracing::info!("Serial link stopped"),
            LinkExit::Failed(e) => tracing::error!(error = %e, "Serial link had failed"),
            LinkExit::Crashed(e) => tracing::error!(error = %e, "Serial link task panicked"),
            LinkExit::TimedOut => tracing::warn!("Serial link did not stop within 5s"),
        }
    }

    let observers = hub.observer_count().await;
    tracing::info!(observers, "Closing remaining WebSocket connections");
    hub.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
