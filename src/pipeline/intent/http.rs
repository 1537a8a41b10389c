use serde::{Deserialize, Serialize};

use super::oracle::IntentOracle;
use super::types::OraclePrediction;
use super::OracleError;

/// Client for a classifier served over HTTP.
///
/// `POST {base_url}/classify` with `{"text": ...}`; the service answers
/// with the label and either a `confidence` or the full `probabilities`
/// vector, whose maximum is taken as the confidence.
pub struct HttpOracle {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpOracle {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OracleError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    label: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    probabilities: Vec<f32>,
}

impl ClassifyResponse {
    fn into_prediction(self) -> Result<OraclePrediction, OracleError> {
        let confidence = match self.confidence {
            Some(c) => c,
            None => self
                .probabilities
                .iter()
                .copied()
                .reduce(f32::max)
                .ok_or_else(|| {
                    OracleError::ResponseParsing(
                        "response carries neither confidence nor probabilities".into(),
                    )
                })?,
        };
        Ok(OraclePrediction {
            label: self.label,
            confidence,
        })
    }
}

impl IntentOracle for HttpOracle {
    fn classify(&self, normalized: &str) -> Result<OraclePrediction, OracleError> {
        let url = format!("{}/classify", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ClassifyRequest { text: normalized })
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    OracleError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    OracleError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    OracleError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ClassifyResponse = response
            .json()
            .map_err(|e| OracleError::ResponseParsing(e.to_string()))?;

        parsed.into_prediction()
    }
}
