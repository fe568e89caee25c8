//! Domain errors for the UX-Map orchestrator.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a command and leave all persisted files untouched.
///
/// Candidate-level failures (validation, duplicate fingerprints) are not
/// errors; they are recorded as rejections in the audit log and processing
/// continues.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Round {0} is pending merge. Run merge-round first.")]
    RoundPending(u32),

    #[error("No pending round to merge. Run prepare-round first.")]
    NoPendingRound,

    #[error("Missing manifest for round {round}: {path}")]
    MissingManifest { round: u32, path: PathBuf },

    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid JSON output in {path}: {reason}")]
    InvalidWorkerOutput { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
