//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    #[error("No model loaded; train or load a model first")]
    ModelNotLoaded,

    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Model artifact unreadable: {0}")]
    ArtifactCorrupt(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Import error: {0}")]
    Import(String),
}

impl Error {
    /// Whether a failed artifact load can be recovered by retraining
    pub fn is_recoverable_load_failure(&self) -> bool {
        matches!(
            self,
            Error::ArtifactNotFound(_) | Error::ArtifactCorrupt(_) | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
