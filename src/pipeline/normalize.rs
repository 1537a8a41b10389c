//! Text normalization for the intent classifier.
//!
//! The classifier was trained on text passed through exactly this
//! pipeline: lowercase, punctuation to space, slang substitution per
//! token, stop-word removal, single-space join. Entity extraction works
//! on the raw text and never sees this output.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::lexicon::LexiconError;

const BUILTIN_SLANG: &str = include_str!("../../data/normalizer/slang.json");
const BUILTIN_STOPWORDS: &str = include_str!("../../data/normalizer/stopwords.json");

pub const SLANG_FILE: &str = "slang.json";
pub const STOPWORDS_FILE: &str = "stopwords.json";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Invalid punctuation regex"));

/// Slang dictionary plus stop-word set, shared read-only across sessions.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    slang: HashMap<String, String>,
    stopwords: HashSet<String>,
}

impl Normalizer {
    pub fn new(slang: HashMap<String, String>, stopwords: HashSet<String>) -> Self {
        Self { slang, stopwords }
    }

    /// Normalizer built from the artifacts compiled in from `data/normalizer/`.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_SLANG, BUILTIN_STOPWORDS).expect("Built-in normalizer must parse")
    }

    pub fn from_json(slang: &str, stopwords: &str) -> Result<Self, LexiconError> {
        let slang: HashMap<String, String> =
            serde_json::from_str(slang).map_err(|source| LexiconError::Json {
                file: SLANG_FILE.to_string(),
                source,
            })?;
        let stopwords: HashSet<String> =
            serde_json::from_str(stopwords).map_err(|source| LexiconError::Json {
                file: STOPWORDS_FILE.to_string(),
                source,
            })?;
        Ok(Self::new(slang, stopwords))
    }

    /// Load `slang.json` and `stopwords.json` from the model directory,
    /// falling back to the built-in artifact for any file that is absent.
    pub fn load_dir(dir: &Path) -> Result<Self, LexiconError> {
        let read = |file: &str, builtin: &str| -> Result<String, LexiconError> {
            let path = dir.join(file);
            if !path.exists() {
                return Ok(builtin.to_string());
            }
            std::fs::read_to_string(&path).map_err(|source| LexiconError::Io {
                file: file.to_string(),
                source,
            })
        };

        let normalizer = Self::from_json(
            &read(SLANG_FILE, BUILTIN_SLANG)?,
            &read(STOPWORDS_FILE, BUILTIN_STOPWORDS)?,
        )?;
        tracing::info!(
            dir = %dir.display(),
            slang = normalizer.slang.len(),
            stopwords = normalizer.stopwords.len(),
            "Normalizer artifacts loaded"
        );
        Ok(normalizer)
    }

    pub fn normalize(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let spaced = NON_WORD.replace_all(&lower, " ");

        spaced
            .split_whitespace()
            .map(|word| self.slang.get(word).map(String::as_str).unwrap_or(word))
            .filter(|word| !self.stopwords.contains(*word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
