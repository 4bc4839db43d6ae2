//! Error types for semindex

use thiserror::Error;

/// Result type alias using SemIndexError
pub type Result<T> = std::result::Result<T, SemIndexError>;

/// Error type alias for convenience
pub type Error = SemIndexError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for semindex
#[derive(Debug, Error)]
pub enum SemIndexError {
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Invalid API spec: {0}")]
    InvalidApiSpec(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid chunking options: {0}")]
    InvalidOptions(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Task history error: {0}")]
    History(String),

    #[error("Progress store error: {0}")]
    Progress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Joined(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SemIndexError {
    /// Whether the file that produced this error should be skipped
    /// and counted as ignored rather than failed.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::UnsupportedFile(_) | Self::InvalidApiSpec(_))
    }

    /// Whether this error marks a job as timed out rather than failed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Combine multiple errors into one, keeping only the most recent `cap`.
    pub fn join(mut errors: Vec<SemIndexError>, cap: usize) -> SemIndexError {
        let total = errors.len();
        if total > cap {
            errors.drain(..total - cap);
        }
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        if total > cap {
            SemIndexError::Joined(format!("{total} errors, {cap} most recent: {joined}"))
        } else {
            SemIndexError::Joined(joined)
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedFile(_) | Self::InvalidApiSpec(_) | Self::InvalidOptions(_) => {
                exit_codes::INVALID_INPUT
            }
            Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
