use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the classifier boundary.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model artifact not found at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {reason}")]
    InvalidArtifact { reason: String },

    #[error("model not loaded")]
    Unavailable,

    #[error("classifier produced an undefined (NaN) score")]
    UndefinedScore,
}
