//! Error types for the backend probe

use thiserror::Error;

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors that can occur while talking to the backend
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The request never produced a response
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        /// Endpoint path
        endpoint: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Endpoint path
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Failed to parse response from {endpoint}: {message}")]
    InvalidResponse {
        /// Endpoint path
        endpoint: String,
        /// Parse error
        message: String,
    },

    /// An authenticated endpoint was called before logging in
    #[error("Not authenticated; log in first")]
    NotAuthenticated,

    /// Configuration or validation error
    #[error(transparent)]
    Core(#[from] aira_core::Error),

    /// Notification queue error
    #[error(transparent)]
    Notify(#[from] aira_notify::NotifyError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Whether the backend could not be reached at all
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Http { source, .. } if source.is_connect() || source.is_timeout())
    }
}
