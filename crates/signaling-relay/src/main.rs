//! Signaling Server
//!
//! WebSocket signaling relay for two-party WebRTC sessions, plus the token
//! API that gates it.
//!
//! # Routes
//!
//! - `GET /ws` - signaling WebSocket (optionally token-gated)
//! - `POST /token`, `POST /token/validate` - access tokens
//! - `GET /health`, `GET /ready` - health checks
//! - `GET /metrics` - Prometheus text
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Spawn the relay actor and the session reaper
//! 4. Bind the listener and serve
//! 5. Mark ready, then wait for SIGTERM / Ctrl-C

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use signaling_relay::actors::RelayActorHandle;
use signaling_relay::config::Config;
use signaling_relay::observability::HealthState;
use signaling_relay::routes::{build_routes, AppState};
use signaling_relay::tasks::{start_session_reaper, ReaperConfig};
use token_service::TokenService;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long in-flight work gets after the shutdown signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "signaling_relay=debug,token_service=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Signaling Server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        reaper_interval_seconds = config.reaper_interval_seconds,
        session_max_age_seconds = config.session_max_age_seconds,
        require_token = config.require_token,
        strict_signature = config.token.strict_signature,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let prometheus_handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        format!("Failed to install Prometheus metrics recorder: {e}")
    })?;

    let health_state = Arc::new(HealthState::new());
    let root_token = CancellationToken::new();

    let (relay, relay_task) = RelayActorHandle::spawn(root_token.child_token());
    info!("Relay actor started");

    let reaper_handle = tokio::spawn(start_session_reaper(
        relay.clone(),
        ReaperConfig::from(&config),
        root_token.child_token(),
    ));

    let tokens = Arc::new(TokenService::new(&config.token));

    let metrics_router = Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );

    let app = build_routes(AppState {
        relay,
        tokens,
        health: Arc::clone(&health_state),
        require_token: config.require_token,
    })
    .merge(metrics_router);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.bind_address, "Invalid bind address");
        format!("Invalid bind address: {e}")
    })?;

    // Bind before spawning to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind listener");
        format!("Failed to bind {addr}: {e}")
    })?;

    let server_token = root_token.child_token();
    let server_handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            server_token.cancelled().await;
            info!("HTTP server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "HTTP server failed");
        }
    });

    health_state.set_ready();
    info!(addr = %addr, "Signaling Server running - press Ctrl+C to shutdown");

    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");

    // Stop advertising readiness first so load balancers drain us
    health_state.set_not_ready();
    root_token.cancel();

    for (name, handle) in [
        ("http server", server_handle),
        ("session reaper", reaper_handle),
        ("relay actor", relay_task),
    ] {
        match tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(task = name, error = %e, "Task ended abnormally"),
            Err(_) => warn!(task = name, "Task did not stop within grace period"),
        }
    }

    info!("Signaling Server shutdown complete");
    Ok(())
}

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
