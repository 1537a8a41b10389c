//! Transport-agnostic application state.
//!
//! `CoreState` owns everything a turn needs: the normalizer, the entity
//! extractor, the intent oracle and the live sessions. It is built once at
//! startup, wrapped in `Arc` and shared with the HTTP layer.

use std::time::Duration;

use uuid::Uuid;

use crate::config::AppConfig;
use crate::dialog::{DialogError, TurnOrchestrator, TurnOutcome};
use crate::lexicon::{Lexicon, LexiconError};
use crate::pipeline::extraction::EntityExtractor;
use crate::pipeline::intent::http::HttpOracle;
use crate::pipeline::intent::naive_bayes::{NaiveBayesOracle, MODEL_FILE};
use crate::pipeline::intent::{IntentOracle, OracleError};
use crate::pipeline::normalize::Normalizer;
use crate::session_store::{lock_session, SessionStore};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    sessions: SessionStore,
    normalizer: Normalizer,
    extractor: EntityExtractor,
    oracle: Box<dyn IntentOracle>,
    /// Human-readable description of the active oracle, reported by health.
    model: String,
    /// Sessions untouched for longer than this are evicted.
    pub session_idle: Duration,
}

impl CoreState {
    pub fn new(
        normalizer: Normalizer,
        extractor: EntityExtractor,
        oracle: Box<dyn IntentOracle>,
        model: impl Into<String>,
        session_idle: Duration,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            normalizer,
            extractor,
            oracle,
            model: model.into(),
            session_idle,
        }
    }

    /// Build from resolved configuration: lexicon and normalizer tables
    /// from their directories (built-ins when absent), and the oracle from
    /// the remote URL when configured, the local model artifact otherwise.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let lexicon = match &config.lexicon_dir {
            Some(dir) if dir.is_dir() => Lexicon::load_dir(dir)?,
            _ => Lexicon::builtin(),
        };
        let normalizer = match &config.model_dir {
            Some(dir) if dir.is_dir() => Normalizer::load_dir(dir)?,
            _ => Normalizer::builtin(),
        };

        let (oracle, model): (Box<dyn IntentOracle>, String) = match &config.oracle_url {
            Some(url) => {
                let oracle = HttpOracle::new(url, config.oracle_timeout.as_secs())?;
                let model = format!("remote:{}", oracle.base_url());
                (Box::new(oracle), model)
            }
            None => {
                let dir = config.model_dir.clone().ok_or(StartupError::NoModelDir)?;
                let path = dir.join(MODEL_FILE);
                let oracle = NaiveBayesOracle::load(&path)?;
                let model = format!("naive_bayes:{} classes", oracle.classes().len());
                (Box::new(oracle), model)
            }
        };

        Ok(Self::new(
            normalizer,
            EntityExtractor::new(lexicon),
            oracle,
            model,
            config.session_idle,
        ))
    }

    /// Run one chat turn for the given session, starting a new session when
    /// the id is missing or unknown. Blocking: the oracle may do network I/O.
    pub fn handle_chat(
        &self,
        session_id: Option<Uuid>,
        message: &str,
    ) -> Result<(Uuid, TurnOutcome), CoreError> {
        let mut requested = session_id;
        loop {
            let (id, handle) = self.sessions.resume_or_begin(requested)?;
            let mut session = lock_session(&handle)?;
            if session.is_closed() {
                // Swept or reset between lookup and lock.
                tracing::debug!(session_id = %id, "Session closed while waiting, starting over");
                requested = None;
                continue;
            }

            let orchestrator =
                TurnOrchestrator::new(&self.normalizer, &self.extractor, self.oracle.as_ref());
            let outcome = orchestrator.process_turn(session.dialog_mut(), message)?;

            tracing::debug!(
                session_id = %id,
                slot = %outcome.slot,
                accepted = ?outcome.accepted,
                "Session turn complete"
            );
            return Ok((id, outcome));
        }
    }

    /// Forget a session. Returns whether it existed.
    pub fn reset_session(&self, id: &Uuid) -> Result<bool, CoreError> {
        Ok(self.sessions.reset(id)?)
    }

    pub fn evict_idle_sessions(&self) -> Result<usize, CoreError> {
        Ok(self.sessions.evict_idle(self.session_idle)?)
    }

    pub fn active_sessions(&self) -> Result<usize, CoreError> {
        Ok(self.sessions.len()?)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Intent classification failed: {0}")]
    Oracle(OracleError),
}

impl From<DialogError> for CoreError {
    fn from(err: DialogError) -> Self {
        match err {
            DialogError::Oracle(e) => CoreError::Oracle(e),
            DialogError::LockPoisoned => CoreError::LockPoisoned,
        }
    }
}

/// Errors that stop the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Lexicon error: {0}")]
    Lexicon(#[from] LexiconError),
    #[error("Intent oracle error: {0}")]
    Oracle(#[from] OracleError),
    #[error("No model directory: set ANAMNESA_MODEL_DIR or ANAMNESA_ORACLE_URL")]
    NoModelDir,
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
