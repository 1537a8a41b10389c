//! In-process inference over an exported TF-IDF + multinomial naive Bayes model.
//!
//! The artifact is produced by the training pipeline, outside this crate.
//! Only inference is implemented: tokenization, n-gram counting, idf
//! weighting, L2 normalisation, joint log-likelihood and softmax.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::oracle::IntentOracle;
use super::types::OraclePrediction;
use super::OracleError;

pub const MODEL_FILE: &str = "intent_model.json";

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid token regex"));

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[derive(Debug, Deserialize)]
struct NaiveBayesArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    classes: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

/// Loaded model, validated for shape consistency.
#[derive(Debug)]
pub struct NaiveBayesOracle {
    model: NaiveBayesArtifact,
}

impl NaiveBayesOracle {
    pub fn load(path: &Path) -> Result<Self, OracleError> {
        let raw = std::fs::read_to_string(path).map_err(|source| OracleError::ArtifactIo {
            path: path.display().to_string(),
            source,
        })?;
        let oracle = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            classes = oracle.model.classes.len(),
            features = oracle.model.idf.len(),
            "Intent model loaded"
        );
        Ok(oracle)
    }

    pub fn from_json(raw: &str) -> Result<Self, OracleError> {
        let model: NaiveBayesArtifact =
            serde_json::from_str(raw).map_err(|e| OracleError::InvalidModel(e.to_string()))?;
        validate(&model)?;
        Ok(Self { model })
    }

    pub fn classes(&self) -> &[String] {
        &self.model.classes
    }

    /// TF-IDF vector as sparse (feature index, weight) pairs, L2-normalised.
    fn vectorize(&self, text: &str) -> Vec<(usize, f64)> {
        let tokens: Vec<&str> = TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect();
        let (min_n, max_n) = self.model.ngram_range;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                if let Some(&idx) = self.model.vocabulary.get(&window.join(" ")) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.model.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.model.idf[idx])
            })
            .collect();

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        weights
    }

    /// Posterior class probabilities, in `classes` order.
    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        let features = self.vectorize(text);

        let joint: Vec<f64> = self
            .model
            .class_log_prior
            .iter()
            .zip(&self.model.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior + features.iter().map(|&(idx, w)| w * log_probs[idx]).sum::<f64>()
            })
            .collect();

        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = joint.iter().map(|j| (j - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / total).collect()
    }
}

fn validate(model: &NaiveBayesArtifact) -> Result<(), OracleError> {
    let n_features = model.idf.len();
    let n_classes = model.classes.len();

    if n_classes == 0 {
        return Err(OracleError::InvalidModel("no classes".into()));
    }
    if model.class_log_prior.len() != n_classes || model.feature_log_prob.len() != n_classes {
        return Err(OracleError::InvalidModel(format!(
            "expected {n_classes} class rows, got {} priors and {} likelihood rows",
            model.class_log_prior.len(),
            model.feature_log_prob.len()
        )));
    }
    if let Some(row) = model.feature_log_prob.iter().find(|r| r.len() != n_features) {
        return Err(OracleError::InvalidModel(format!(
            "likelihood row has {} features, idf has {n_features}",
            row.len()
        )));
    }
    if let Some((term, idx)) = model.vocabulary.iter().find(|(_, &i)| i >= n_features) {
        return Err(OracleError::InvalidModel(format!(
            "term '{term}' maps to index {idx} outside {n_features} features"
        )));
    }
    let (min_n, max_n) = model.ngram_range;
    if min_n == 0 || min_n > max_n {
        return Err(OracleError::InvalidModel(format!(
            "invalid ngram range ({min_n}, {max_n})"
        )));
    }
    Ok(())
}

impl IntentOracle for NaiveBayesOracle {
    fn classify(&self, normalized: &str) -> Result<OraclePrediction, OracleError> {
        let proba = self.predict_proba(normalized);
        let (best, confidence) = proba
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        Ok(OraclePrediction {
            label: self.model.classes[best].clone(),
            confidence: confidence as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two classes over a three-term vocabulary, bigrams enabled.
    const TOY_MODEL: &str = r#"{
        "vocabulary": {"halo": 0, "demam": 1, "sudah hari": 2},
        "idf": [1.0, 1.0, 2.0],
        "ngram_range": [1, 2],
        "classes": ["sapaan", "jawab_durasi"],
        "class_log_prior": [-0.6931, -0.6931],
        "feature_log_prob": [
            [-0.2, -2.0, -3.0],
            [-3.0, -1.0, -0.1]
        ]
    }"#;

    #[test]
    fn picks_class_with_highest_posterior() {
        let oracle = NaiveBayesOracle::from_json(TOY_MODEL).unwrap();
        assert_eq!(oracle.classify("halo").unwrap().label, "sapaan");
        assert_eq!(oracle.classify("sudah hari").unwrap().label, "jawab_durasi");
    }

    #[test]
    fn probabilities_sum_to_one() {
        let oracle = NaiveBayesOracle::from_json(TOY_MODEL).unwrap();
        let proba = oracle.predict_proba("halo demam");
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_max_probability() {
        let oracle = NaiveBayesOracle::from_json(TOY_MODEL).unwrap();
        let proba = oracle.predict_proba("halo");
        let prediction = oracle.classify("halo").unwrap();
        assert!((prediction.confidence as f64 - proba[0]).abs() < 1e-6);
    }

    #[test]
    fn unknown_text_falls_back_to_priors() {
        let oracle = NaiveBayesOracle::from_json(TOY_MODEL).unwrap();
        let proba = oracle.predict_proba("xyz abc");
        assert!((proba[0] - 0.5).abs() < 1e-9);
        assert_eq!(oracle.classify("").unwrap().label, "sapaan");
    }

    #[test]
    fn single_char_tokens_are_ignored() {
        let oracle = NaiveBayesOracle::from_json(TOY_MODEL).unwrap();
        assert_eq!(oracle.predict_proba("a b c"), oracle.predict_proba(""));
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let bad = r#"{
            "vocabulary": {"halo": 0},
            "idf": [1.0],
            "classes": ["a", "b"],
            "class_log_prior": [-0.7],
            "feature_log_prob": [[-0.1], [-0.2]]
        }"#;
        assert!(matches!(
            NaiveBayesOracle::from_json(bad),
            Err(OracleError::InvalidModel(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_vocabulary_index() {
        let bad = r#"{
            "vocabulary": {"halo": 3},
            "idf": [1.0],
            "classes": ["a"],
            "class_log_prior": [0.0],
            "feature_log_prob": [[-0.1]]
        }"#;
        assert!(NaiveBayesOracle::from_json(bad).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = NaiveBayesOracle::load(&tmp.path().join(MODEL_FILE)).unwrap_err();
        assert!(matches!(err, OracleError::ArtifactIo { .. }));
    }
}
