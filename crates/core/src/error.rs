// Central Error Type for the Relay
// One variant per pipeline stage so callers can pick log-and-continue vs abort-cycle

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Non-2xx status, timeout, connection failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response signature did not match the shared key
    #[error("Authenticity error: {0}")]
    Authenticity(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Reading or writing a persisted document failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short stage label used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Transport(_) => "transport",
            AppError::Authenticity(_) => "authenticity",
            AppError::Parse(_) | AppError::Serialization(_) => "parse",
            AppError::Persistence(_) | AppError::Io(_) => "persistence",
            AppError::Execution(_) => "execution",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
