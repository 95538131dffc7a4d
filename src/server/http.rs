//! HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::predictor::PredictorStatus;
use crate::server::ServerState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: PredictorStatus,
    pub uptime_secs: u64,
    pub version: &'static str,
}

pub async fn index_handler() -> impl IntoResponse {
    (StatusCode::OK, "Queen prediction bot is running")
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Predictor snapshot; the lock is held only while copying the status
pub async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let status = state.predictor.lock().await.status();

    let response = StatusResponse {
        status,
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: crate::VERSION,
    };

    (StatusCode::OK, Json(response))
}
