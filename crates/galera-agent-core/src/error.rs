//! Error types for the Galera agent
//!
//! This module defines the error taxonomy shared by the codec, the state
//! store, the process reloader and the orchestrators.

use thiserror::Error;

/// Common result type for agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for agent operations
#[derive(Debug, Error)]
pub enum Error {
    // Caller input
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    // Engine process
    #[error("process '{0}' not found")]
    ProcessNotFound(String),

    #[error("error sending signal to process '{process}' with pid {pid}: {reason}")]
    Signal {
        process: String,
        pid: u32,
        reason: String,
    },

    #[error("maximum retries ({retries}) reached attempting to reload '{process}' process")]
    RetriesExhausted { process: String, retries: u32 },

    // Persisted state
    #[error("format error: {0}")]
    Format(String),

    #[error("maximum retries ({retries}) reached attempting to recover galera from recovery log")]
    RecoveryTimedOut { retries: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a not found error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if a reload attempt failing with this error may be retried
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProcessNotFound(_))
    }

    /// Get the HTTP status code the agent API reports for this error
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::PreconditionFailed(_) => 412,
            Self::ProcessNotFound(_)
            | Self::Signal { .. }
            | Self::RetriesExhausted { .. }
            | Self::Format(_)
            | Self::RecoveryTimedOut { .. }
            | Self::Io(_)
            | Self::Internal(_) => 500,
        }
    }
}
