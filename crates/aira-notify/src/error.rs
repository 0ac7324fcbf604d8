//! Error types for the notification queue

use thiserror::Error;

/// Result type alias for queue operations
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors raised at the queue's API boundary
///
/// Queue operations on existing state never fail; these only report misuse.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NotifyError {
    /// An argument was rejected before touching the queue
    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument {
        /// Name of the offending argument
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The queue was built outside a Tokio runtime
    #[error("No Tokio runtime available to drive dismissal timers")]
    NoRuntime,
}

impl NotifyError {
    /// Create a new invalid argument error
    #[must_use]
    pub fn invalid_argument<F: Into<String>, S: Into<String>>(field: F, reason: S) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<aira_core::Error> for NotifyError {
    fn from(err: aira_core::Error) -> Self {
        match err {
            aira_core::Error::Validation { field, message } => Self::InvalidArgument {
                field,
                reason: message,
            },
            other => Self::invalid_argument("input", other.to_string()),
        }
    }
}
