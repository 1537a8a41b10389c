use std::fmt;

use serde::Serialize;

use super::prompt::PromptTemplate;
use crate::pipeline::intent::Intent;

/// One question position in the interview, in asking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Slot {
    #[serde(rename = "greeting")]
    Greeting,
    #[serde(rename = "nama")]
    FullName,
    #[serde(rename = "nama_panggilan")]
    Nickname,
    #[serde(rename = "umur")]
    Age,
    #[serde(rename = "jenis_kelamin")]
    Gender,
    #[serde(rename = "keluhan_utama")]
    ChiefComplaint,
    #[serde(rename = "gejala")]
    Symptoms,
    #[serde(rename = "durasi")]
    Duration,
    #[serde(rename = "lokasi")]
    Location,
    #[serde(rename = "severity")]
    Severity,
    #[serde(rename = "riwayat_penyakit")]
    DiseaseHistory,
    #[serde(rename = "riwayat_obat")]
    Medication,
    #[serde(rename = "alergi")]
    Allergy,
    #[serde(rename = "faktor_risiko")]
    RiskFactor,
    #[serde(rename = "summary")]
    Summary,
}

// ═══════════════════════════════════════════════════════════
// Prompt tables
// ═══════════════════════════════════════════════════════════

const NO_RETRY: &[PromptTemplate] = &[];

const FULL_NAME_RETRY: &[PromptTemplate] =
    &[PromptTemplate::new("Boleh tahu nama lengkap Anda?")];
const NICKNAME_RETRY: &[PromptTemplate] = &[PromptTemplate::new("Boleh dipanggil siapa?")];
const AGE_RETRY: &[PromptTemplate] = &[PromptTemplate::new("Berapa usia Anda saat ini?")];
const GENDER_RETRY: &[PromptTemplate] =
    &[PromptTemplate::new("Jenis kelamin Anda laki-laki atau perempuan?")];
const CHIEF_COMPLAINT_RETRY: &[PromptTemplate] = &[
    PromptTemplate::new("Bisa ceritakan lagi keluhan utama yang Anda rasakan?"),
    PromptTemplate::new("Bisa dijelaskan keluhan yang Anda alami saat ini?"),
];
const SYMPTOMS_RETRY: &[PromptTemplate] = &[
    PromptTemplate::new("Apakah ada gejala lain yang menyertai?"),
    PromptTemplate::new("Selain itu, ada gejala penyerta lainnya?"),
];
const DURATION_RETRY: &[PromptTemplate] = &[
    PromptTemplate::new("Sudah berapa lama Anda merasakan keluhan ini? Contoh: 3 hari, 1 minggu"),
    PromptTemplate::new("Bisa sebutkan sudah berapa lama mengalami keluhan tersebut?"),
];
const LOCATION_RETRY: &[PromptTemplate] = &[
    PromptTemplate::new("Di bagian tubuh mana Anda merasakan keluhan tersebut?"),
    PromptTemplate::new("Bisa sebutkan lokasi keluhan yang Anda rasakan?"),
];
const SEVERITY_RETRY: &[PromptTemplate] = &[
    PromptTemplate::new("Tingkat keparahannya ringan, sedang, atau berat?"),
    PromptTemplate::new("Seberapa parah yang Anda rasakan?"),
];
const DISEASE_HISTORY_RETRY: &[PromptTemplate] = &[PromptTemplate::new(
    "Apakah ada riwayat penyakit sebelumnya? Jika tidak, sebutkan \"tidak ada\"",
)];
const MEDICATION_RETRY: &[PromptTemplate] = &[PromptTemplate::new(
    "Apakah sedang mengonsumsi obat? Jika tidak, sebutkan \"tidak\"",
)];
const ALLERGY_RETRY: &[PromptTemplate] = &[PromptTemplate::new(
    "Apakah ada alergi terhadap makanan atau obat? Jika tidak, sebutkan \"tidak ada\"",
)];
const RISK_FACTOR_RETRY: &[PromptTemplate] = &[PromptTemplate::new(
    "Apakah ada kebiasaan tertentu? Seperti merokok, kurang olahraga, dll. Jika tidak, sebutkan \"tidak ada\"",
)];

// ═══════════════════════════════════════════════════════════
// Expected intents (empty = accept anything)
// ═══════════════════════════════════════════════════════════

const ANY_INTENT: &[Intent] = &[];
const CHIEF_COMPLAINT_INTENTS: &[Intent] = &[Intent::ChiefComplaint, Intent::AnswerSymptoms];
const SYMPTOMS_INTENTS: &[Intent] = &[
    Intent::AnswerSymptoms,
    Intent::ChiefComplaint,
    Intent::Denial,
    Intent::Unclear,
];
const DURATION_INTENTS: &[Intent] = &[Intent::AnswerDuration];
const LOCATION_INTENTS: &[Intent] = &[Intent::AnswerLocation];
const SEVERITY_INTENTS: &[Intent] = &[Intent::AnswerSeverity];
const DISEASE_HISTORY_INTENTS: &[Intent] =
    &[Intent::AnswerDiseaseHistory, Intent::Denial, Intent::Unclear];
const MEDICATION_INTENTS: &[Intent] = &[Intent::AnswerMedication, Intent::Denial, Intent::Unclear];
const ALLERGY_INTENTS: &[Intent] = &[Intent::AnswerAllergy, Intent::Denial, Intent::Unclear];
const RISK_FACTOR_INTENTS: &[Intent] =
    &[Intent::AnswerRiskFactor, Intent::Denial, Intent::Unclear];

impl Slot {
    pub const COUNT: usize = 15;

    /// Fixed asking order; the last entry is terminal.
    pub const FLOW: [Slot; Slot::COUNT] = [
        Slot::Greeting,
        Slot::FullName,
        Slot::Nickname,
        Slot::Age,
        Slot::Gender,
        Slot::ChiefComplaint,
        Slot::Symptoms,
        Slot::Duration,
        Slot::Location,
        Slot::Severity,
        Slot::DiseaseHistory,
        Slot::Medication,
        Slot::Allergy,
        Slot::RiskFactor,
        Slot::Summary,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Following slot; the terminal slot is its own successor.
    pub fn next(self) -> Slot {
        Self::FLOW
            .get(self.index() + 1)
            .copied()
            .unwrap_or(Slot::Summary)
    }

    pub fn is_terminal(self) -> bool {
        self == Slot::Summary
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Greeting => "greeting",
            Slot::FullName => "nama",
            Slot::Nickname => "nama_panggilan",
            Slot::Age => "umur",
            Slot::Gender => "jenis_kelamin",
            Slot::ChiefComplaint => "keluhan_utama",
            Slot::Symptoms => "gejala",
            Slot::Duration => "durasi",
            Slot::Location => "lokasi",
            Slot::Severity => "severity",
            Slot::DiseaseHistory => "riwayat_penyakit",
            Slot::Medication => "riwayat_obat",
            Slot::Allergy => "alergi",
            Slot::RiskFactor => "faktor_risiko",
            Slot::Summary => "summary",
        }
    }

    pub fn prompt(self) -> PromptTemplate {
        PromptTemplate::new(match self {
            Slot::Greeting => {
                "Selamat datang di Chatbot PUSTU. Saya akan membantu mencatat keluhan Anda. \
                 Boleh saya tahu nama lengkap Anda?"
            }
            Slot::FullName => "Boleh saya tahu nama lengkap Anda?",
            Slot::Nickname => "Baik, boleh dipanggil apa?",
            Slot::Age => "{nama}, berapa usia Anda?",
            Slot::Gender => "Jenis kelamin Anda? (laki-laki/perempuan)",
            Slot::ChiefComplaint => {
                "Baik {nama}, sekarang ceritakan keluhan utama yang Anda rasakan."
            }
            Slot::Symptoms => "Apakah ada gejala lain yang menyertai?",
            Slot::Duration => "Sudah berapa lama {nama} merasakan keluhan ini?",
            Slot::Location => "Di bagian tubuh mana {nama} merasakan keluhan tersebut?",
            Slot::Severity => "Seberapa parah yang Anda rasakan? Ringan, sedang, atau berat?",
            Slot::DiseaseHistory => "{nama}, apakah Anda memiliki riwayat penyakit sebelumnya?",
            Slot::Medication => "Apakah saat ini sedang mengonsumsi obat-obatan?",
            Slot::Allergy => "Apakah {nama} memiliki alergi terhadap makanan atau obat tertentu?",
            Slot::RiskFactor => {
                "Apakah ada kebiasaan yang ingin Anda sampaikan? \
                 Seperti merokok, kurang olahraga, dll."
            }
            Slot::Summary => {
                "Terima kasih {nama} atas informasinya. Berikut ringkasan hasil anamnesis Anda:"
            }
        })
    }

    /// Re-ask variants, chosen round-robin by retry count. Empty means
    /// the primary prompt is repeated.
    pub fn retry_prompts(self) -> &'static [PromptTemplate] {
        match self {
            Slot::Greeting | Slot::Summary => NO_RETRY,
            Slot::FullName => FULL_NAME_RETRY,
            Slot::Nickname => NICKNAME_RETRY,
            Slot::Age => AGE_RETRY,
            Slot::Gender => GENDER_RETRY,
            Slot::ChiefComplaint => CHIEF_COMPLAINT_RETRY,
            Slot::Symptoms => SYMPTOMS_RETRY,
            Slot::Duration => DURATION_RETRY,
            Slot::Location => LOCATION_RETRY,
            Slot::Severity => SEVERITY_RETRY,
            Slot::DiseaseHistory => DISEASE_HISTORY_RETRY,
            Slot::Medication => MEDICATION_RETRY,
            Slot::Allergy => ALLERGY_RETRY,
            Slot::RiskFactor => RISK_FACTOR_RETRY,
        }
    }

    pub fn expected_intents(self) -> &'static [Intent] {
        match self {
            Slot::Greeting
            | Slot::FullName
            | Slot::Nickname
            | Slot::Age
            | Slot::Gender
            | Slot::Summary => ANY_INTENT,
            Slot::ChiefComplaint => CHIEF_COMPLAINT_INTENTS,
            Slot::Symptoms => SYMPTOMS_INTENTS,
            Slot::Duration => DURATION_INTENTS,
            Slot::Location => LOCATION_INTENTS,
            Slot::Severity => SEVERITY_INTENTS,
            Slot::DiseaseHistory => DISEASE_HISTORY_INTENTS,
            Slot::Medication => MEDICATION_INTENTS,
            Slot::Allergy => ALLERGY_INTENTS,
            Slot::RiskFactor => RISK_FACTOR_INTENTS,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
