use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::extraction::Entities;

/// What kind of content a turn carries.
///
/// Labels from the classifier are accepted in either its training
/// vocabulary (`jawab_durasi`) or the canonical snake_case name
/// (`answer_duration`). Anything else is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    Greeting,
    Thanks,
    ChiefComplaint,
    AnswerSymptoms,
    AnswerDuration,
    AnswerLocation,
    AnswerSeverity,
    AnswerDiseaseHistory,
    AnswerMedication,
    AnswerAllergy,
    AnswerRiskFactor,
    Denial,
    Unclear,
    Other(String),
}

impl Intent {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "greeting" | "sapaan" => Self::Greeting,
            "thanks" | "ucapan_terima_kasih" => Self::Thanks,
            "chief_complaint" | "keluhan_utama" => Self::ChiefComplaint,
            "answer_symptoms" | "jawab_gejala_penyerta" => Self::AnswerSymptoms,
            "answer_duration" | "jawab_durasi" => Self::AnswerDuration,
            "answer_location" | "jawab_lokasi" => Self::AnswerLocation,
            "answer_severity" | "jawab_severity" => Self::AnswerSeverity,
            "answer_disease_history" | "jawab_riwayat_penyakit" => Self::AnswerDiseaseHistory,
            "answer_medication" | "jawab_riwayat_obat" => Self::AnswerMedication,
            "answer_allergy" | "jawab_alergi" => Self::AnswerAllergy,
            "answer_risk_factor" | "jawab_faktor_risiko" => Self::AnswerRiskFactor,
            "denial" | "penyangkalan" => Self::Denial,
            "unclear" | "tidak_jelas" => Self::Unclear,
            _ => Self::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Greeting => "greeting",
            Self::Thanks => "thanks",
            Self::ChiefComplaint => "chief_complaint",
            Self::AnswerSymptoms => "answer_symptoms",
            Self::AnswerDuration => "answer_duration",
            Self::AnswerLocation => "answer_location",
            Self::AnswerSeverity => "answer_severity",
            Self::AnswerDiseaseHistory => "answer_disease_history",
            Self::AnswerMedication => "answer_medication",
            Self::AnswerAllergy => "answer_allergy",
            Self::AnswerRiskFactor => "answer_risk_factor",
            Self::Denial => "denial",
            Self::Unclear => "unclear",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Intent {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Intent> for String {
    fn from(intent: Intent) -> Self {
        intent.as_str().to_string()
    }
}

/// Raw classifier output for one normalized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OraclePrediction {
    pub label: String,
    /// Probability of `label`, the maximum of the class distribution.
    pub confidence: f32,
}

/// Final intent after rule overrides, with the evidence that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedIntent {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: Entities,
    /// Text as handed to the classifier.
    pub normalized: String,
    /// Override rule that fired, `None` when the classifier label stood.
    pub rule: Option<&'static str>,
}
