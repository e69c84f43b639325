//! Telemed Hub
//!
//! Presence & Signaling Hub for the telemedicine backend. One axum server
//! carries the WebSocket endpoint (`/ws`) and the health probes
//! (`/health`, `/ready`) on a single bind address.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Build the user directory (optionally seeded from a JSON file)
//! 3. Spawn the hub actor
//! 4. Bind the listener and start serving (fail fast on bind errors)
//! 5. Mark ready, wait for shutdown signal
//! 6. On signal: mark not ready, cancel the actor, drain the server

#![warn(clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use hub_service::actors::HubActor;
use hub_service::config::Config;
use hub_service::directory::{InMemoryDirectory, UserDirectory};
use hub_service::observability::{health_router, HealthState};
use hub_service::ws::{ws_router, WsState};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Grace period for in-flight connections after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hub_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Telemed Hub");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        session_channel_buffer = config.session_channel_buffer,
        "Configuration loaded successfully"
    );

    // Build the user directory
    let directory = Arc::new(InMemoryDirectory::new());
    if let Some(path) = &config.seed_users_path {
        let count = directory.seed_from_file(path).await.map_err(|e| {
            error!(error = %e, path = %path, "Failed to seed user directory");
            e
        })?;
        info!(path = %path, count = count, "User directory seeded");
    }

    // Initialize health state
    let health_state = Arc::new(HealthState::new());

    // Spawn the hub actor
    let (hub, actor_task) = HubActor::spawn(Arc::clone(&directory) as Arc<dyn UserDirectory>);
    info!("Hub actor started");

    // Shutdown token as child of the hub's token, so cancelling the hub
    // also drains the server
    let shutdown_token = hub.child_token();

    let app = ws_router(WsState {
        hub: hub.clone(),
        jwt_secret: config.jwt_secret.clone(),
        session_channel_buffer: config.session_channel_buffer,
    })
    .merge(health_router(Arc::clone(&health_state)))
    .layer(TraceLayer::new_for_http());

    // Bind BEFORE spawning to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %config.bind_address, "Failed to bind server");
            format!("Failed to bind server to {}: {e}", config.bind_address)
        })?;
    info!(addr = %config.bind_address, "Server bound successfully");

    let server_shutdown_token = shutdown_token.child_token();
    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            server_shutdown_token.cancelled().await;
            info!("Server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Server failed");
        }
    });

    health_state.set_ready();
    info!("Telemed Hub running - press Ctrl+C to shutdown");

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown...");

    // Stop admitting new connections first
    health_state.set_not_ready();

    // Cancel the hub; child tokens drain the server
    hub.cancel();

    if tokio::time::timeout(SHUTDOWN_GRACE, server_task)
        .await
        .is_err()
    {
        warn!("Server did not drain within the grace period");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, actor_task)
        .await
        .is_err()
    {
        warn!("Hub actor did not stop within the grace period");
    }

    info!("Telemed Hub shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
