//! Per-message policy on top of `DialogState`.
//!
//! Order of decisions for one turn: greeting bootstrap, classification,
//! digression, uncertainty, slot-specific overrides, transition, escalation,
//! reply composition.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::slots::Slot;
use super::state::DialogState;
use super::{DialogError, MAX_RETRIES_BEFORE_FORCE};
use crate::pipeline::extraction::{Entities, EntityExtractor};
use crate::pipeline::intent::resolver::resolve_intent;
use crate::pipeline::intent::{Intent, IntentOracle};
use crate::pipeline::normalize::Normalizer;

/// Whole words only: names like Khairul or Shaira contain `hai`.
static GREETING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:halo|hai|assalamualaikum|selamat|permisi)\b")
        .expect("Invalid greeting regex")
});

const UNCERTAINTY_KEYWORDS: &[&str] = &[
    "tidak tahu",
    "tidak tau",
    "kurang tahu",
    "tidak jelas",
    "tidak yakin",
    "kurang jelas",
];

const CHIEF_COMPLAINT_KEYWORDS: &[&str] = &[
    "demam", "sakit", "pusing", "mual", "batuk", "flu", "muntah", "diare", "gatal",
];

const SYMPTOM_KEYWORDS: &[&str] = &[
    "sakit", "nyeri", "pusing", "mual", "muntah", "diare", "batuk", "pilek", "demam", "lemas",
    "panas", "dingin", "menggigil", "sesak", "gatal", "bengkak", "kram", "kaku", "berdarah",
];

const SEVERITY_KEYWORDS: &[&str] = &["ringan", "sedang", "berat", "parah", "sangat"];

const SALAM_REPLY: &str = "Waalaikumsalam. ";
const GREETING_REPLY: &str = "Halo! ";
const BOT_INTRODUCTION: &str = "Saya chatbot PUSTU yang akan membantu Anda. ";
const THANKS_REPLY: &str = "Sama-sama! Mari kita lanjutkan. ";

static DURATION_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s*(?:hari|minggu|bulan|tahun|jam|menit)").expect("Invalid duration regex")
});

/// Slot-local rule: when it applies, the answer is accepted under `intent`
/// whatever the classifier said.
struct SlotOverride {
    slot: Slot,
    applies: fn(&str, &Entities) -> bool,
    intent: Intent,
}

static SLOT_OVERRIDES: [SlotOverride; 5] = [
    SlotOverride {
        slot: Slot::ChiefComplaint,
        applies: |lower, _| CHIEF_COMPLAINT_KEYWORDS.iter().any(|kw| lower.contains(kw)),
        intent: Intent::ChiefComplaint,
    },
    SlotOverride {
        slot: Slot::Symptoms,
        applies: |lower, _| SYMPTOM_KEYWORDS.iter().any(|kw| lower.contains(kw)),
        intent: Intent::AnswerSymptoms,
    },
    SlotOverride {
        slot: Slot::Severity,
        applies: |lower, _| SEVERITY_KEYWORDS.iter().any(|kw| lower.contains(kw)),
        intent: Intent::AnswerSeverity,
    },
    SlotOverride {
        slot: Slot::Duration,
        applies: |lower, _| DURATION_MENTION.is_match(lower),
        intent: Intent::AnswerDuration,
    },
    SlotOverride {
        slot: Slot::Location,
        applies: |_, entities| entities.location.is_some(),
        intent: Intent::AnswerLocation,
    },
];

/// Result of one turn, ready for the transport layer.
///
/// The classification fields are `None` for the greeting bootstrap;
/// `accepted` is also `None` for digressions, which never transition.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub prompt: String,
    pub slot: Slot,
    pub intent: Option<Intent>,
    pub confidence: Option<f32>,
    pub entities: Option<Entities>,
    pub accepted: Option<bool>,
}

pub struct TurnOrchestrator<'a> {
    normalizer: &'a Normalizer,
    extractor: &'a EntityExtractor,
    oracle: &'a dyn IntentOracle,
}

impl<'a> TurnOrchestrator<'a> {
    pub fn new(
        normalizer: &'a Normalizer,
        extractor: &'a EntityExtractor,
        oracle: &'a dyn IntentOracle,
    ) -> Self {
        Self {
            normalizer,
            extractor,
            oracle,
        }
    }

    /// Process one user message against the session's dialog state.
    ///
    /// A classifier failure returns before any mutation, so the state is
    /// exactly as it was before the call.
    pub fn process_turn(
        &self,
        state: &mut DialogState,
        text: &str,
    ) -> Result<TurnOutcome, DialogError> {
        if state.current() == Slot::Greeting {
            let prompt = state.current_prompt(false);
            state.leave_greeting();
            tracing::debug!("Greeting issued");
            return Ok(TurnOutcome {
                prompt,
                slot: Slot::Greeting,
                intent: None,
                confidence: None,
                entities: None,
                accepted: None,
            });
        }

        let normalized = self.normalizer.normalize(text);
        let prediction = self.oracle.classify(&normalized).map_err(|e| {
            tracing::warn!(slot = %state.current(), error = %e, "Intent classification failed");
            e
        })?;
        let entities = self.extractor.extract(text);
        let resolved = resolve_intent(text, normalized, entities, &prediction);
        let lower = text.to_lowercase();

        if let Some(prompt) = digression_reply(state, &lower, &resolved.intent) {
            tracing::debug!(
                slot = %state.current(),
                intent = %resolved.intent,
                "Digression acknowledged"
            );
            return Ok(TurnOutcome {
                prompt,
                slot: state.current(),
                intent: Some(resolved.intent),
                confidence: Some(resolved.confidence),
                entities: Some(resolved.entities),
                accepted: None,
            });
        }

        let uncertain = resolved.intent == Intent::Unclear
            || UNCERTAINTY_KEYWORDS.iter().any(|kw| lower.contains(kw));

        let (intent, force) = if uncertain {
            (resolved.intent.clone(), true)
        } else {
            match slot_override(state.current(), &lower, &resolved.entities) {
                Some(forced) => (forced, true),
                None => (resolved.intent.clone(), false),
            }
        };

        let slot_before = state.current();
        let mut accepted = self.advance(state, &intent, text, &resolved.entities, force);

        if !accepted && state.current_retry_count() >= MAX_RETRIES_BEFORE_FORCE {
            tracing::debug!(slot = %state.current(), "Retry limit reached, forcing answer");
            accepted = self.advance(state, &intent, text, &resolved.entities, true);
        }

        tracing::debug!(
            slot = %slot_before,
            next = %state.current(),
            intent = %intent,
            confidence = resolved.confidence,
            rule = resolved.rule.unwrap_or("classifier"),
            uncertain,
            accepted,
            "Turn processed"
        );

        let prompt = if !accepted {
            state.current_prompt(true)
        } else if state.is_terminal() {
            format!("{}\n\n{}", state.current_prompt(false), state.render_summary())
        } else {
            state.current_prompt(false)
        };

        Ok(TurnOutcome {
            prompt,
            slot: state.current(),
            intent: Some(intent),
            confidence: Some(resolved.confidence),
            entities: Some(resolved.entities),
            accepted: Some(accepted),
        })
    }

    /// Transition, then on success prefill and skip answered slots.
    fn advance(
        &self,
        state: &mut DialogState,
        intent: &Intent,
        text: &str,
        entities: &Entities,
        force: bool,
    ) -> bool {
        if !state.transition(intent.clone(), text, entities.clone(), force) {
            return false;
        }
        let filled = state.prefill(entities);
        let skipped = state.skip_filled();
        if !filled.is_empty() || skipped > 0 {
            tracing::debug!(?filled, skipped, "Prefilled from volunteered answer");
        }
        true
    }
}

fn digression_reply(state: &DialogState, lower: &str, intent: &Intent) -> Option<String> {
    let greeted = GREETING_PATTERN.is_match(lower);
    if greeted || *intent == Intent::Greeting {
        let salute = if lower.contains("assalamualaikum") {
            SALAM_REPLY
        } else {
            GREETING_REPLY
        };
        return Some(format!("{salute}{BOT_INTRODUCTION}{}", state.current_prompt(false)));
    }
    if *intent == Intent::Thanks {
        return Some(format!("{THANKS_REPLY}{}", state.current_prompt(false)));
    }
    None
}

fn slot_override(slot: Slot, lower: &str, entities: &Entities) -> Option<Intent> {
    SLOT_OVERRIDES
        .iter()
        .find(|rule| rule.slot == slot && (rule.applies)(lower, entities))
        .map(|rule| rule.intent.clone())
}
