//! Slot-driven interview engine.
//!
//! `DialogState` owns the position in the fixed question sequence and the
//! recorded answers; `TurnOrchestrator` decides, per user message, what
//! happens to that state.

pub mod slots;
pub mod prompt;
pub mod state;
pub mod summary;
pub mod orchestrator;

use thiserror::Error;

use crate::pipeline::intent::OracleError;

pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use slots::Slot;
pub use state::{Answer, DialogState};

/// Upper bound on slots skipped by one `skip_filled` call.
pub const MAX_SKIP_STEPS: usize = 5;

/// Failed attempts on one slot before its answer is force-accepted.
pub const MAX_RETRIES_BEFORE_FORCE: u32 = 2;

#[derive(Error, Debug)]
pub enum DialogError {
    #[error("Intent classification failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("Session lock poisoned")]
    LockPoisoned,
}
