//! Clinical summary rendered from recorded answers.
//!
//! Three sections in fixed order: identity, anamnesis, medical history.
//! Slots without an answer are left out, and so is any section left empty.

use std::sync::LazyLock;

use regex::Regex;

use super::slots::Slot;
use super::state::DialogState;
use crate::pipeline::extraction::{title_case, FEMALE_LABEL, MALE_LABEL};

const BORDER_WIDTH: usize = 60;
const NONE_LABEL: &str = "Tidak ada";

/// Answers starting with one of these words mean "nothing to report".
const NEGATION_PREFIXES: &[&str] = &[
    "tidak ada",
    "tidak tahu",
    "tidak",
    "ga",
    "gak",
    "enggak",
    "nggak",
];

/// Severity vocabulary folded onto three clinical levels, checked in order.
const SEVERITY_LEVELS: &[(&str, &str)] = &[
    ("ringan", "Ringan"),
    ("sedang", "Sedang"),
    ("berat", "Berat"),
    ("parah", "Berat"),
    ("sangat", "Berat"),
];

static NAME_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(saya|nama\s+saya|nama)\s+").expect("Invalid name filler regex")
});

static LEADING_PRONOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(saya|aku)\s+").expect("Invalid pronoun regex"));

static INNER_PRONOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(saya|aku)\s+").expect("Invalid pronoun regex"));

static HONORIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(dokter|dok|bu|pak|mas|mbak|kak)\b\s*").expect("Invalid honorific regex")
});

static CONTEXT_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(sudah|sejak|selama|sekitar|kurang lebih)\s+\d+\s*(hari|minggu|bulan|tahun|jam|menit)",
    )
    .expect("Invalid duration regex")
});

static TRAILING_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+\d+\s*(hari|minggu|bulan|tahun|jam|menit)\s*$")
        .expect("Invalid duration regex")
});

static INFORMAL_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(juga|sekali|banget)\b").expect("Invalid filler regex"));

static SAKIT_KEPALA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsakit kepala\b").expect("Invalid term regex"));

static SAKIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsakit\b").expect("Invalid term regex"));

static LEADING_DI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^di\s+").expect("Invalid preposition regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

pub fn render(state: &DialogState) -> String {
    let answer = |slot: Slot| state.answer(slot).map(|a| a.text.trim());

    let mut identity = Vec::new();
    if let Some(text) = answer(Slot::FullName) {
        identity.push(format!("Nama          : {}", clean_name(text)));
    }
    if let Some(text) = answer(Slot::Age) {
        identity.push(format!("Usia          : {}", clean_age(text)));
    }
    if let Some(text) = answer(Slot::Gender) {
        identity.push(format!("Jenis Kelamin : {}", clean_gender(text)));
    }

    let mut anamnesis = Vec::new();
    if let Some(text) = answer(Slot::ChiefComplaint) {
        anamnesis.push(format!("Keluhan Utama       : {}", clean_chief_complaint(text)));
    }
    if let Some(text) = answer(Slot::Symptoms) {
        anamnesis.push(format!("Gejala Penyerta     : {}", clean_symptoms(text)));
    }
    if let Some(text) = answer(Slot::Duration) {
        anamnesis.push(format!("Durasi              : {}", capitalize(text)));
    }
    if let Some(text) = answer(Slot::Location) {
        anamnesis.push(format!("Lokasi              : {}", clean_location(text)));
    }
    if let Some(text) = answer(Slot::Severity) {
        anamnesis.push(format!("Tingkat Keparahan   : {}", clean_severity(text)));
    }

    let mut history = Vec::new();
    let history_fields = [
        (Slot::DiseaseHistory, "Riwayat Penyakit    : "),
        (Slot::Medication, "Obat yang Dikonsumsi : "),
        (Slot::Allergy, "Riwayat Alergi      : "),
        (Slot::RiskFactor, "Faktor Risiko       : "),
    ];
    for (slot, label) in history_fields {
        if let Some(text) = answer(slot) {
            history.push(format!("{label}{}", clean_history(text)));
        }
    }

    let heavy = "=".repeat(BORDER_WIDTH);
    let light = "-".repeat(BORDER_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    if !identity.is_empty() {
        lines.push(heavy.clone());
        lines.push("IDENTITAS PASIEN".to_string());
        lines.push(heavy.clone());
        lines.extend(identity);
        lines.push(String::new());
    }
    if !anamnesis.is_empty() {
        lines.push("ANAMNESIS".to_string());
        lines.push(light.clone());
        lines.extend(anamnesis);
        lines.push(String::new());
    }
    if !history.is_empty() {
        lines.push("RIWAYAT MEDIS".to_string());
        lines.push(light);
        lines.extend(history);
    }
    lines.push(heavy);

    lines.join("\n")
}

// ═══════════════════════════════════════════════════════════
// Field cleanup
// ═══════════════════════════════════════════════════════════

/// First character uppercased, the rest lowercased.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn strip_honorifics(text: &str) -> String {
    HONORIFIC.replace_all(text, " ").into_owned()
}

fn clean_name(text: &str) -> String {
    title_case(NAME_FILLER.replace(text, "").trim())
}

fn clean_age(text: &str) -> String {
    let age = LEADING_PRONOUN.replace(text, "");
    if age.to_lowercase().contains("tahun") {
        age.into_owned()
    } else {
        format!("{age} tahun")
    }
}

fn clean_gender(text: &str) -> String {
    let lower = text.to_lowercase();
    if ["laki", "pria", "cowok"].iter().any(|kw| lower.contains(kw)) {
        MALE_LABEL.to_string()
    } else if ["perempuan", "wanita", "cewek"].iter().any(|kw| lower.contains(kw)) {
        FEMALE_LABEL.to_string()
    } else {
        capitalize(&lower)
    }
}

fn clean_chief_complaint(text: &str) -> String {
    let text = LEADING_PRONOUN.replace(text, "");
    let text = strip_honorifics(&text);
    let text = CONTEXT_DURATION.replace_all(&text, "");
    let text = TRAILING_DURATION.replace_all(&text, "");
    capitalize(&collapse_whitespace(&text))
}

fn clean_symptoms(text: &str) -> String {
    let text = LEADING_PRONOUN.replace(text, "");
    let text = INNER_PRONOUN.replace_all(&text, " ");
    let text = strip_honorifics(&text);
    let text = INFORMAL_WORDS.replace_all(&text, "");
    let text = collapse_whitespace(&text);
    let text = SAKIT_KEPALA.replace_all(&text, "nyeri kepala");
    let text = SAKIT.replace_all(&text, "nyeri");
    capitalize(&text)
}

fn clean_location(text: &str) -> String {
    let text = LEADING_DI.replace(text, "");
    let text = strip_honorifics(&text);
    capitalize(&collapse_whitespace(&text))
}

fn clean_severity(text: &str) -> String {
    let lower = text.to_lowercase();
    SEVERITY_LEVELS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, level)| level.to_string())
        .unwrap_or(lower)
}

fn clean_history(text: &str) -> String {
    let text = LEADING_PRONOUN.replace(text, "");
    let text = collapse_whitespace(&strip_honorifics(&text));
    if is_negation(&text.to_lowercase()) {
        NONE_LABEL.to_string()
    } else {
        capitalize(&text)
    }
}

/// Whole-word prefix match, so "gatal" is not read as "ga".
fn is_negation(lower: &str) -> bool {
    NEGATION_PREFIXES.iter().any(|prefix| {
        lower.strip_prefix(prefix).is_some_and(|rest| {
            rest.chars().next().map_or(true, |c| !c.is_alphanumeric())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heavy() -> String {
        "=".repeat(BORDER_WIDTH)
    }

    fn light() -> String {
        "-".repeat(BORDER_WIDTH)
    }

    #[test]
    fn medication_negation_renders_none() {
        let state = DialogState::with_answers(&[(Slot::Medication, "tidak ada obat")]);
        let expected = format!(
            "RIWAYAT MEDIS\n{}\nObat yang Dikonsumsi : Tidak ada\n{}",
            light(),
            heavy()
        );
        assert_eq!(render(&state), expected);
    }

    #[test]
    fn full_interview_renders_every_section_in_order() {
        let state = DialogState::with_answers(&[
            (Slot::FullName, "Nama saya budi santoso"),
            (Slot::Nickname, "budi"),
            (Slot::Age, "28"),
            (Slot::Gender, "laki-laki"),
            (Slot::ChiefComplaint, "saya demam sudah 3 hari dok"),
            (Slot::Symptoms, "saya juga sakit kepala banget"),
            (Slot::Duration, "sudah 3 hari"),
            (Slot::Location, "di perut bagian kanan"),
            (Slot::Severity, "lumayan parah"),
            (Slot::DiseaseHistory, "pernah tipes"),
            (Slot::Medication, "tidak ada"),
            (Slot::Allergy, "alergi udang"),
            (Slot::RiskFactor, "merokok"),
        ]);
        let expected = [
            heavy(),
            "IDENTITAS PASIEN".into(),
            heavy(),
            "Nama          : Budi Santoso".into(),
            "Usia          : 28 tahun".into(),
            "Jenis Kelamin : Laki-laki".into(),
            String::new(),
            "ANAMNESIS".into(),
            light(),
            "Keluhan Utama       : Demam".into(),
            "Gejala Penyerta     : Nyeri kepala".into(),
            "Durasi              : Sudah 3 hari".into(),
            "Lokasi              : Perut bagian kanan".into(),
            "Tingkat Keparahan   : Berat".into(),
            String::new(),
            "RIWAYAT MEDIS".into(),
            light(),
            "Riwayat Penyakit    : Pernah tipes".into(),
            "Obat yang Dikonsumsi : Tidak ada".into(),
            "Riwayat Alergi      : Alergi udang".into(),
            "Faktor Risiko       : Merokok".into(),
            heavy(),
        ]
        .join("\n");
        assert_eq!(render(&state), expected);
    }

    #[test]
    fn negation_is_matched_on_whole_words() {
        assert_eq!(clean_history("gatal kalau makan udang"), "Gatal kalau makan udang");
        assert_eq!(clean_history("gak ada"), NONE_LABEL);
        assert_eq!(clean_history("Tidak."), NONE_LABEL);
        assert_eq!(clean_history("saya nggak minum obat"), NONE_LABEL);
    }

    #[test]
    fn honorifics_are_whole_words() {
        assert_eq!(clean_chief_complaint("sakit buat jalan bu"), "Sakit buat jalan");
        assert_eq!(clean_location("di kepala dok"), "Kepala");
    }

    #[test]
    fn chief_complaint_drops_trailing_duration() {
        assert_eq!(clean_chief_complaint("batuk pilek 2 minggu"), "Batuk pilek");
    }

    #[test]
    fn age_keeps_existing_unit() {
        assert_eq!(clean_age("saya 40 tahun"), "40 tahun");
        assert_eq!(clean_age("40"), "40 tahun");
    }

    #[test]
    fn gender_and_severity_fallbacks() {
        assert_eq!(clean_gender("Wanita"), FEMALE_LABEL);
        assert_eq!(clean_gender("RAHASIA"), "Rahasia");
        assert_eq!(clean_severity("Sedang saja"), "Sedang");
        assert_eq!(clean_severity("biasa saja"), "biasa saja");
    }

    #[test]
    fn empty_state_renders_only_closing_border() {
        assert_eq!(render(&DialogState::new()), heavy());
    }

    #[test]
    fn capitalize_lowercases_tail() {
        assert_eq!(capitalize("dEMAM Tinggi"), "Demam tinggi");
        assert_eq!(capitalize(""), "");
    }
}
