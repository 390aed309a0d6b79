//! Error types for the alumni API client.

use thiserror::Error;

/// Result type for alumni API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Alumni API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration error (invalid base URL, client could not be built)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No response received (connection refused, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status for server errors, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when no response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
