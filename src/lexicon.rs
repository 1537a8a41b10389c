//! Read-only keyword tables backing entity extraction.
//!
//! Three tables are loaded once at startup: symptoms (canonical name plus
//! synonyms), severity levels and body locations. Each table is an ordered
//! list of `(key, keywords)` pairs. Order is the load order of the JSON
//! source and acts as the tie-break when several keys match one text.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

const BUILTIN_SYMPTOMS: &str = include_str!("../data/lexicon/symptoms.json");
const BUILTIN_SEVERITY: &str = include_str!("../data/lexicon/severity.json");
const BUILTIN_LOCATION: &str = include_str!("../data/lexicon/location.json");

pub const SYMPTOMS_FILE: &str = "symptoms.json";
pub const SEVERITY_FILE: &str = "severity.json";
pub const LOCATION_FILE: &str = "location.json";

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid entry '{key}' in {file}: {reason}")]
    InvalidEntry {
        file: String,
        key: String,
        reason: String,
    },
}

// ═══════════════════════════════════════════════════════════
// KeywordTable
// ═══════════════════════════════════════════════════════════

/// One table row: the canonical key and every lowercase keyword that maps to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    pub key: String,
    pub keywords: Vec<String>,
}

impl KeywordEntry {
    fn matches(&self, lower_text: &str) -> bool {
        self.keywords.iter().any(|kw| lower_text.contains(kw.as_str()))
    }
}

/// Ordered keyword table. Lookups expect already-lowercased text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    entries: Vec<KeywordEntry>,
}

impl KeywordTable {
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        Self { entries }
    }

    /// First key (in table order) with any keyword contained in the text.
    pub fn first_match(&self, lower_text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.matches(lower_text))
            .map(|e| e.key.as_str())
    }

    /// Every matching key, once, in table order.
    pub fn all_matches(&self, lower_text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.matches(lower_text))
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════
// Table shapes
// ═══════════════════════════════════════════════════════════

/// How keywords are laid out under each key in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableShape {
    /// `{"demam": {"synonyms": [...]}}` (the key itself is also a keyword).
    Synonyms,
    /// `{"berat": {"keywords": [...]}}`
    Keywords,
    /// `{"kepala": [...]}`
    PlainList,
}

fn parse_table(json: &str, file: &str, shape: TableShape) -> Result<KeywordTable, LexiconError> {
    let root: Value = serde_json::from_str(json).map_err(|source| LexiconError::Json {
        file: file.to_string(),
        source,
    })?;

    let invalid = |key: &str, reason: &str| LexiconError::InvalidEntry {
        file: file.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let object = root
        .as_object()
        .ok_or_else(|| invalid("<root>", "expected a JSON object"))?;

    let mut entries = Vec::with_capacity(object.len());
    for (key, value) in object {
        let list = match shape {
            TableShape::Synonyms => value.get("synonyms"),
            TableShape::Keywords => value.get("keywords"),
            TableShape::PlainList => Some(value),
        };

        let mut keywords = Vec::new();
        if shape == TableShape::Synonyms {
            keywords.push(key.to_lowercase());
        }

        match list {
            Some(Value::Array(items)) => {
                for item in items {
                    let kw = item
                        .as_str()
                        .ok_or_else(|| invalid(key, "keywords must be strings"))?
                        .trim()
                        .to_lowercase();
                    if kw.is_empty() {
                        return Err(invalid(key, "empty keyword"));
                    }
                    if !keywords.contains(&kw) {
                        keywords.push(kw);
                    }
                }
            }
            // Symptom entries may omit synonyms entirely.
            None | Some(Value::Null) if shape == TableShape::Synonyms => {}
            _ => return Err(invalid(key, "missing keyword list")),
        }

        if key.trim().is_empty() {
            return Err(invalid(key, "empty key"));
        }
        if keywords.is_empty() {
            return Err(invalid(key, "no keywords"));
        }

        entries.push(KeywordEntry {
            key: key.to_lowercase(),
            keywords,
        });
    }

    Ok(KeywordTable::new(entries))
}

// ═══════════════════════════════════════════════════════════
// Lexicon
// ═══════════════════════════════════════════════════════════

/// The three extraction dictionaries, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    pub symptoms: KeywordTable,
    pub severity: KeywordTable,
    pub location: KeywordTable,
}

impl Lexicon {
    /// Parse the three tables from JSON sources.
    pub fn from_json(symptoms: &str, severity: &str, location: &str) -> Result<Self, LexiconError> {
        Ok(Self {
            symptoms: parse_table(symptoms, SYMPTOMS_FILE, TableShape::Synonyms)?,
            severity: parse_table(severity, SEVERITY_FILE, TableShape::Keywords)?,
            location: parse_table(location, LOCATION_FILE, TableShape::PlainList)?,
        })
    }

    /// Tables compiled into the binary from `data/lexicon/`.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_SYMPTOMS, BUILTIN_SEVERITY, BUILTIN_LOCATION)
            .expect("Built-in lexicon must parse")
    }

    /// Load tables from a directory. A missing file falls back to the
    /// built-in table of the same name; a present but invalid file is an error.
    pub fn load_dir(dir: &Path) -> Result<Self, LexiconError> {
        let symptoms = read_or_builtin(dir, SYMPTOMS_FILE, BUILTIN_SYMPTOMS)?;
        let severity = read_or_builtin(dir, SEVERITY_FILE, BUILTIN_SEVERITY)?;
        let location = read_or_builtin(dir, LOCATION_FILE, BUILTIN_LOCATION)?;

        let lexicon = Self::from_json(&symptoms, &severity, &location)?;
        tracing::info!(
            dir = %dir.display(),
            symptoms = lexicon.symptoms.len(),
            severity = lexicon.severity.len(),
            location = lexicon.location.len(),
            "Lexicon loaded"
        );
        Ok(lexicon)
    }
}

fn read_or_builtin(dir: &Path, file: &str, builtin: &str) -> Result<String, LexiconError> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::debug!(file, "Lexicon file absent, using built-in table");
        return Ok(builtin.to_string());
    }
    std::fs::read_to_string(&path).map_err(|source| LexiconError::Io {
        file: file.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_load_in_file_order() {
        let lexicon = Lexicon::builtin();
        let keys: Vec<&str> = lexicon.severity.keys().collect();
        assert_eq!(keys, vec!["ringan", "sedang", "berat"]);
        assert_eq!(lexicon.location.keys().next(), Some("kepala"));
        assert_eq!(lexicon.symptoms.keys().next(), Some("demam"));
    }

    #[test]
    fn first_match_uses_table_order_not_text_order() {
        let table = parse_table(
            r#"{"perut": ["perut"], "kepala": ["kepala"]}"#,
            LOCATION_FILE,
            TableShape::PlainList,
        )
        .unwrap();
        // "kepala" appears first in the text, but "perut" is first in the table.
        assert_eq!(table.first_match("kepala dan perut"), Some("perut"));
    }

    #[test]
    fn symptom_key_is_its_own_keyword() {
        let table = parse_table(
            r#"{"demam": {"synonyms": ["meriang"]}, "batuk": {}}"#,
            SYMPTOMS_FILE,
            TableShape::Synonyms,
        )
        .unwrap();
        assert_eq!(table.all_matches("saya batuk"), vec!["batuk".to_string()]);
        assert_eq!(table.all_matches("badan meriang"), vec!["demam".to_string()]);
    }

    #[test]
    fn keywords_are_lowercased() {
        let table = parse_table(
            r#"{"Berat": {"keywords": ["PARAH"]}}"#,
            SEVERITY_FILE,
            TableShape::Keywords,
        )
        .unwrap();
        assert_eq!(table.first_match("sangat parah"), Some("berat"));
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let err = parse_table(r#"{"kepala": [""]}"#, LOCATION_FILE, TableShape::PlainList)
            .unwrap_err();
        assert!(matches!(err, LexiconError::InvalidEntry { .. }));
    }

    #[test]
    fn severity_entry_without_keywords_is_rejected() {
        let err = parse_table(r#"{"berat": {"level": 3}}"#, SEVERITY_FILE, TableShape::Keywords)
            .unwrap_err();
        assert!(err.to_string().contains("missing keyword list"));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = parse_table("[1, 2]", LOCATION_FILE, TableShape::PlainList).unwrap_err();
        assert!(matches!(err, LexiconError::InvalidEntry { .. }));
    }

    #[test]
    fn load_dir_overrides_present_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(LOCATION_FILE),
            r#"{"lutut": ["lutut", "dengkul"]}"#,
        )
        .unwrap();

        let lexicon = Lexicon::load_dir(tmp.path()).unwrap();
        assert_eq!(lexicon.location.len(), 1);
        assert_eq!(lexicon.location.first_match("dengkul nyeri"), Some("lutut"));
        assert_eq!(lexicon.severity, Lexicon::builtin().severity);
    }

    #[test]
    fn load_dir_reports_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SEVERITY_FILE), "{not json").unwrap();
        let err = Lexicon::load_dir(tmp.path()).unwrap_err();
        assert!(matches!(err, LexiconError::Json { .. }));
    }
}
