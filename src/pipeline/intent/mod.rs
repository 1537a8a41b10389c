pub mod types;
pub mod oracle;
pub mod naive_bayes;
pub mod http;
pub mod resolver;

use thiserror::Error;

pub use oracle::IntentOracle;
pub use types::{Intent, OraclePrediction, ResolvedIntent};

/// Failures of the external intent classifier. Always fatal for the turn.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Classifier service unreachable at {0}")]
    Connection(String),

    #[error("Classifier HTTP client error: {0}")]
    HttpClient(String),

    #[error("Classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Classifier response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Failed to read model artifact {path}: {source}")]
    ArtifactIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),
}
