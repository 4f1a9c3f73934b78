use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load structured index from {path}: {reason}")]
    IndexLoad { path: PathBuf, reason: String },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Operation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn index_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::IndexLoad { path: path.into(), reason: reason.to_string() }
    }

    /// Startup failures the process must not keep serving through.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::IndexLoad { .. } | Self::MissingCredential(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Backend(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
