//! Interview endpoints.
//!
//! - `POST /api/chat`: process one patient message
//! - `POST /api/reset`: forget an interview

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{
    parse_session_id, ApiContext, ChatRequest, ChatResponse, ResetRequest, ResetResponse,
    MAX_MESSAGE_CHARS,
};

/// `POST /api/chat`: run one turn.
///
/// The turn may block on the classifier, so it runs on the blocking pool.
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_MESSAGE_CHARS} chars)"
        )));
    }

    let session_id = parse_session_id(req.session_id.as_deref());
    let core = Arc::clone(&ctx.core);
    let message = req.message;

    let (id, outcome) =
        tokio::task::spawn_blocking(move || core.handle_chat(session_id, &message))
            .await
            .map_err(|e| ApiError::Internal(format!("Turn task failed: {e}")))??;

    Ok(Json(ChatResponse::from_outcome(id, outcome)))
}

/// `POST /api/reset`: drop the session if it exists. Always succeeds.
pub async fn reset(
    State(ctx): State<ApiContext>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    if let Some(id) = parse_session_id(req.session_id.as_deref()) {
        ctx.core.reset_session(&id)?;
    }
    Ok(Json(ResetResponse {
        message: "Session reset successful",
    }))
}
