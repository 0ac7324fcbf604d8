//! Email-format validation for backend credentials

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidateEmail};

/// Login credentials sent to the backend
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct Credentials {
    /// Account email address
    #[validate(email(message = "not a valid email address"))]
    pub email: String,

    /// Account password
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

impl Credentials {
    /// Create credentials without validating them
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validate the credentials, reporting the first offending field
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if the email is malformed or the
    /// password is empty.
    pub fn check(&self) -> crate::Result<()> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));

            fields
                .into_iter()
                .next()
                .map_or_else(
                    || crate::Error::validation("credentials", "invalid credentials"),
                    |(field, errs)| {
                        let message = errs
                            .iter()
                            .find_map(|e| e.message.as_ref().map(ToString::to_string))
                            .unwrap_or_else(|| "invalid value".to_string());
                        crate::Error::validation(field.to_string(), message)
                    },
                )
        })
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Check that a string looks like an email address
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}
