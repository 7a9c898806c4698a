// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefguardError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid request: {0}")]
    Resolution(String),

    #[error("Failed to {operation} {} after {applied} applied change(s): {source}", path.display())]
    Apply {
        path: PathBuf,
        operation: String,
        applied: usize,
        source: std::io::Error,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Another execution holds the lock at {}", path.display())]
    Locked { path: PathBuf },

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {source} (path: {})", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Generic error: {0}")]
    Other(String),
}

impl RefguardError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    /// True for the "file not found" condition raised before any work starts.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, RefguardError>;

// Allow `?` on std::io::Error by converting to RefguardError::Io with unknown path.
impl From<std::io::Error> for RefguardError {
    fn from(source: std::io::Error) -> Self {
        RefguardError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl From<walkdir::Error> for RefguardError {
    fn from(e: walkdir::Error) -> Self {
        RefguardError::Other(e.to_string())
    }
}

impl From<serde_json::Error> for RefguardError {
    fn from(e: serde_json::Error) -> Self {
        RefguardError::Other(format!("JSON: {e}"))
    }
}

impl From<toml::de::Error> for RefguardError {
    fn from(e: toml::de::Error) -> Self {
        RefguardError::Config(e.to_string())
    }
}
