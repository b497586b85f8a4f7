//! Error types for the agent client.

use thiserror::Error;

/// Errors returned by [`crate::Client`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its response not read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent answered with a non-2xx status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A success response carried an unexpected body
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether the agent reported the resource as absent (HTTP 404)
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// HTTP status reported by the agent, if the request got that far
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
