//! Fuses the classifier guess with extracted entities.
//!
//! Rules run in table order; the first one that applies replaces the
//! classifier's label and confidence. When none applies the classifier
//! output is passed through untouched.

use crate::pipeline::extraction::Entities;

use super::types::{Intent, OraclePrediction, ResolvedIntent};

/// Below this classifier confidence a severity word overrides the label.
pub const SEVERITY_OVERRIDE_CEILING: f32 = 0.7;

const LOCATION_MARKERS: &[&str] = &["di", "bagian", "sebelah", "area"];
const ALLERGY_MARKERS: &[&str] = &["alergi", "bentol", "gatal", "ruam"];

/// Evidence visible to a resolution rule.
pub struct RuleInput<'a> {
    pub lower: &'a str,
    pub entities: &'a Entities,
    pub oracle_confidence: f32,
}

pub struct ResolutionRule {
    pub name: &'static str,
    pub applies: fn(&RuleInput<'_>) -> bool,
    pub intent: Intent,
    pub confidence: f32,
}

pub static RESOLUTION_RULES: [ResolutionRule; 4] = [
    ResolutionRule {
        name: "duration_entity",
        applies: |input| input.entities.duration.is_some(),
        intent: Intent::AnswerDuration,
        confidence: 0.95,
    },
    ResolutionRule {
        name: "severity_entity",
        applies: |input| {
            input.entities.severity.is_some() && input.oracle_confidence < SEVERITY_OVERRIDE_CEILING
        },
        intent: Intent::AnswerSeverity,
        confidence: 0.90,
    },
    ResolutionRule {
        name: "location_entity",
        applies: |input| {
            input.entities.location.is_some()
                && LOCATION_MARKERS.iter().any(|m| input.lower.contains(m))
        },
        intent: Intent::AnswerLocation,
        confidence: 0.90,
    },
    ResolutionRule {
        name: "allergy_keyword",
        applies: |input| {
            ALLERGY_MARKERS.iter().any(|m| input.lower.contains(m)) && input.lower.contains("alergi")
        },
        intent: Intent::AnswerAllergy,
        confidence: 0.90,
    },
];

/// Resolve the final intent for one turn.
///
/// `text` is the raw user text; `normalized` is what the classifier saw.
pub fn resolve_intent(
    text: &str,
    normalized: String,
    entities: Entities,
    prediction: &OraclePrediction,
) -> ResolvedIntent {
    let lower = text.to_lowercase();
    let input = RuleInput {
        lower: &lower,
        entities: &entities,
        oracle_confidence: prediction.confidence,
    };

    let fired = RESOLUTION_RULES.iter().find(|rule| (rule.applies)(&input));

    let (intent, confidence, rule) = match fired {
        Some(rule) => {
            tracing::debug!(
                rule = rule.name,
                from = %prediction.label,
                to = %rule.intent,
                "Intent overridden by rule"
            );
            (rule.intent.clone(), rule.confidence, Some(rule.name))
        }
        None => (
            Intent::from_label(&prediction.label),
            prediction.confidence,
            None,
        ),
    };

    ResolvedIntent {
        intent,
        confidence,
        entities,
        normalized,
        rule,
    }
}
