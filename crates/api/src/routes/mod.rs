pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::readings;
use crate::state::AppState;
use crate::ws;

/// Ingestion and streaming routes.
///
/// ```text
/// POST /data   submit one reading
/// GET  /ws     WebSocket stream of classified envelopes
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/data", post(readings::ingest_reading))
        .route("/ws", get(ws::ws_handler))
}
