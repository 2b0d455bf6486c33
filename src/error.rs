//! Error types for the scoring engine.
//!
//! Only failures that stop work live here. Out-of-range identifiers,
//! duplicate submissions and roster gaps are ordinary values that flow
//! through the correction protocol or into reports.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::Subject;

#[derive(Debug, Error)]
pub enum MastError {
    /// A required input could not be read or decoded.
    #[error("failed to load {}: {reason}", path.display())]
    FatalLoad { path: PathBuf, reason: String },

    /// A raw scan line does not satisfy the fixed layout. Aborts the ingest.
    #[error("malformed scan line {line}: {reason}")]
    ParseMalformed { line: usize, reason: String },

    /// The operator typed a replacement that is out of range or not a known value.
    #[error("invalid input: {0}")]
    InvalidCorrectionInput(String),

    #[error("no answer key loaded for {0}")]
    MissingKey(Subject),

    #[error("invalid scoring policy: {}", .0.join("; "))]
    Policy(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MastError {
    pub fn fatal_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MastError::FatalLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        MastError::ParseMalformed {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = MastError> = std::result::Result<T, E>;
