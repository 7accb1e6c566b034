//! Typed error hierarchy for phaser.
//!
//! Two enums cover the two layers:
//! - `PhaseError` — failures raised while a phase runs (hooks or execute)
//! - `ManagerError` — failures from registering phases or routing hooks to them
//!
//! Running a phase that has no execute function is not represented here: it
//! is a misconfiguration and panics instead.

use crate::hook::Stage;
use thiserror::Error;

/// Errors from a single phase run.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("{stage} hook {index} failed: {source}")]
    Hook {
        stage: Stage,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Phase {phase} execute failed: {source}")]
    Execute {
        phase: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhaseError {
    /// The error returned by the hook or execute function, or the replacement
    /// error a custom handler produced.
    pub fn inner(&self) -> &anyhow::Error {
        match self {
            PhaseError::Hook { source, .. } | PhaseError::Execute { source, .. } => source,
            PhaseError::Other(err) => err,
        }
    }

    /// Stage in which the error was raised, if known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PhaseError::Hook { stage, .. } => Some(*stage),
            PhaseError::Execute { .. } => Some(Stage::Execute),
            PhaseError::Other(_) => None,
        }
    }
}

/// Errors from the phase manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Phase {name} is not registered")]
    UnknownPhase { name: String },

    #[error("Phase {name} is already registered")]
    DuplicatePhase { name: String },

    #[error(transparent)]
    Phase(#[from] PhaseError),
}
