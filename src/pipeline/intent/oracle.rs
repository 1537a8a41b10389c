use super::types::OraclePrediction;
use super::OracleError;

/// Statistical text classifier consumed as a black box.
///
/// Input is the normalizer's output, the same form the model was trained
/// on. Implementations must be side-effect free; one instance is shared
/// by every session.
pub trait IntentOracle: Send + Sync {
    fn classify(&self, normalized: &str) -> Result<OraclePrediction, OracleError>;
}

impl<T: IntentOracle + ?Sized> IntentOracle for Box<T> {
    fn classify(&self, normalized: &str) -> Result<OraclePrediction, OracleError> {
        (**self).classify(normalized)
    }
}

impl<T: IntentOracle + ?Sized> IntentOracle for std::sync::Arc<T> {
    fn classify(&self, normalized: &str) -> Result<OraclePrediction, OracleError> {
        (**self).classify(normalized)
    }
}
