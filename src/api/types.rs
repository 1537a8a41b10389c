//! Shared types for the API layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core_state::CoreState;
use crate::dialog::{Slot, TurnOutcome};
use crate::pipeline::extraction::Entities;
use crate::pipeline::intent::Intent;

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Missing, malformed or unknown ids start a new interview.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One bot reply. Classification fields are omitted for the opening
/// greeting; `is_valid` is also omitted for digressions.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub bot_message: String,
    pub state: Slot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Entities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
}

impl ChatResponse {
    pub fn from_outcome(session_id: uuid::Uuid, outcome: TurnOutcome) -> Self {
        Self {
            session_id: session_id.to_string(),
            bot_message: outcome.prompt,
            state: outcome.slot,
            intent: outcome.intent,
            confidence: outcome.confidence,
            entities: outcome.entities,
            is_valid: outcome.accepted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: &'static str,
}

/// Parse a client-supplied session id; anything malformed counts as absent.
pub fn parse_session_id(raw: Option<&str>) -> Option<uuid::Uuid> {
    raw.and_then(|s| uuid::Uuid::parse_str(s.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_id_ignores_garbage() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_session_id(Some(&id.to_string())), Some(id));
        assert_eq!(parse_session_id(Some("not-a-uuid")), None);
        assert_eq!(parse_session_id(None), None);
    }

    #[test]
    fn greeting_response_omits_classification() {
        let outcome = TurnOutcome {
            prompt: "Selamat datang".into(),
            slot: Slot::Greeting,
            intent: None,
            confidence: None,
            entities: None,
            accepted: None,
        };
        let json = serde_json::to_value(ChatResponse::from_outcome(uuid::Uuid::nil(), outcome))
            .unwrap();
        assert_eq!(json["state"], "greeting");
        assert!(json.get("intent").is_none());
        assert!(json.get("is_valid").is_none());
    }

    #[test]
    fn answered_turn_carries_wire_labels() {
        let outcome = TurnOutcome {
            prompt: "Sudah berapa lama?".into(),
            slot: Slot::Duration,
            intent: Some(Intent::AnswerSymptoms),
            confidence: Some(0.8),
            entities: Some(Entities::default()),
            accepted: Some(true),
        };
        let json = serde_json::to_value(ChatResponse::from_outcome(uuid::Uuid::nil(), outcome))
            .unwrap();
        assert_eq!(json["state"], "durasi");
        assert_eq!(json["intent"], Intent::AnswerSymptoms.as_str());
        assert_eq!(json["is_valid"], true);
    }
}
