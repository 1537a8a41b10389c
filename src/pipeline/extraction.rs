//! Deterministic entity extraction from a patient's free-text answer.
//!
//! Every sub-extraction is best-effort: no match yields `None` (or an empty
//! symptom list), never an error. All matching runs on the lowercased raw
//! text; the classifier's normalized text is never used here.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;

/// Facts extracted from one turn. Serialized with the slot ids the chat
/// client expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(rename = "nama")]
    pub name: Option<String>,
    #[serde(rename = "umur")]
    pub age: Option<u32>,
    #[serde(rename = "jenis_kelamin")]
    pub gender: Option<String>,
    #[serde(rename = "durasi")]
    pub duration: Option<String>,
    #[serde(rename = "lokasi")]
    pub location: Option<String>,
    pub severity: Option<String>,
    /// Canonical symptom keys, deduplicated, in lexicon order.
    pub symptoms: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.duration.is_none()
            && self.location.is_none()
            && self.severity.is_none()
            && self.symptoms.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════

const MALE_KEYWORDS: &[&str] = &["laki-laki", "laki", "pria", "cowok", "cowo"];
const FEMALE_KEYWORDS: &[&str] = &["perempuan", "wanita", "cewek", "cewe"];

pub const MALE_LABEL: &str = "Laki-laki";
pub const FEMALE_LABEL: &str = "Perempuan";

/// Words that mark a number as elapsed time rather than an age.
/// Tried in this order; the first context with a match wins.
const DURATION_CONTEXTS: &[&str] = &[
    "sudah",
    "sejak",
    "selama",
    "sekitar",
    "kurang lebih",
    "kira-kira",
    "hampir",
    "lebih dari",
];

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"nama\s+(?:saya\s+)?(\w+(?:\s+\w+)?)").expect("Invalid name regex")
});

static AGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:tahun|th|thn)").expect("Invalid age regex"));

/// Tier 1: context word + number + any time unit.
static CONTEXT_DURATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DURATION_CONTEXTS
        .iter()
        .map(|context| {
            Regex::new(&format!(
                r"{}\s+(\d+)\s*(?:hari|minggu|bulan|tahun|jam|menit)",
                regex::escape(context)
            ))
            .expect("Invalid duration context regex")
        })
        .collect()
});

/// Tier 2: bare number + unit, restricted to units that cannot be an age.
static BARE_DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:hari|minggu|bulan)").expect("Invalid bare duration regex")
});

/// Tier 3: relative-time idioms.
static RELATIVE_DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"sejak\s+(?:kemarin|lusa|seminggu|sebulan|tadi|pagi|siang|sore|malam)")
        .expect("Invalid relative duration regex")
});

// ═══════════════════════════════════════════════════════════
// Extractor
// ═══════════════════════════════════════════════════════════

/// Stateless extractor over a read-only lexicon.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    lexicon: Lexicon,
}

impl EntityExtractor {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Run every sub-extraction on the text.
    pub fn extract(&self, text: &str) -> Entities {
        let lower = text.to_lowercase();
        Entities {
            name: extract_name(&lower),
            age: extract_age(&lower),
            gender: extract_gender(&lower),
            duration: extract_duration(&lower),
            location: self.lexicon.location.first_match(&lower).map(str::to_string),
            severity: self.lexicon.severity.first_match(&lower).map(str::to_string),
            symptoms: self.lexicon.symptoms.all_matches(&lower),
        }
    }
}

fn extract_name(lower: &str) -> Option<String> {
    NAME_PATTERN
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .map(|m| title_case(m.as_str()))
}

fn extract_age(lower: &str) -> Option<u32> {
    AGE_PATTERN
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn extract_gender(lower: &str) -> Option<String> {
    if MALE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Some(MALE_LABEL.to_string())
    } else if FEMALE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Some(FEMALE_LABEL.to_string())
    } else {
        None
    }
}

/// Duration cascade. Returns the whole matched phrase, not just the number.
pub fn extract_duration(lower: &str) -> Option<String> {
    CONTEXT_DURATION_PATTERNS
        .iter()
        .find_map(|re| re.find(lower))
        .or_else(|| BARE_DURATION_PATTERN.find(lower))
        .or_else(|| RELATIVE_DURATION_PATTERN.find(lower))
        .map(|m| m.as_str().to_string())
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
