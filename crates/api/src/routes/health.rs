use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Human-readable service name.
    pub service: &'static str,
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Number of connected dashboard observers.
    pub observers: usize,
}

/// GET / and GET /health -- liveness plus observer count.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "SmartSense Safety Monitor",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        observers: state.hub.observer_count().await,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
}
