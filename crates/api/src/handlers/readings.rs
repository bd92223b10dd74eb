//! Handler for reading submission.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use smartsense_core::reading::{Envelope, Reading};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /data
///
/// Accepts `{temperature, humidity, gas_level}`, classifies it and pushes
/// the envelope to every connected observer. The envelope is echoed back.
pub async fn ingest_reading(
    State(state): State<AppState>,
    payload: Result<Json<Reading>, JsonRejection>,
) -> AppResult<Json<Envelope>> {
    let Json(reading) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected reading payload");
        AppError::BadRequest(rejection.body_text())
    })?;

    let envelope = state.gateway.ingest(reading).await;
    Ok(Json(envelope))
}
