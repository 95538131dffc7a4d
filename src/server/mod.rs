//! Health and status HTTP server
//!
//! Keeps hosting platforms happy and exposes the predictor state as JSON.

pub mod http;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::predictor::SharedPredictor;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub predictor: SharedPredictor,
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(predictor: SharedPredictor) -> Self {
        Self {
            predictor,
            started_at: Instant::now(),
        }
    }
}

/// Build the router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(http::index_handler))
        .route("/health", get(http::health_handler))
        .route("/api/status", get(http::status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until a shutdown signal arrives
pub async fn start(
    config: &ServerConfig,
    state: ServerState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Health server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            info!("Health server shutting down");
        })
        .await
        .context("Health server failed")?;

    Ok(())
}
