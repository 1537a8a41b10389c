//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub version: &'static str,
    pub active_sessions: usize,
}

/// `GET /api/health`: liveness plus the active classifier.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        model: ctx.core.model().to_string(),
        version: crate::config::APP_VERSION,
        active_sessions: ctx.core.active_sessions()?,
    }))
}
