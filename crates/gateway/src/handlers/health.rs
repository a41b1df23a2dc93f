//! Health check and metrics exposition

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::AppState;
use scriptorium_common::errors::{AppError, Result};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness probe - always healthy while the server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let handle = state.prometheus.as_ref().ok_or_else(|| AppError::NotFound {
        resource_type: "metrics recorder".to_string(),
        id: "prometheus".to_string(),
    })?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
