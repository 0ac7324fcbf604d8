//! Configuration management for the AIRA notification toolkit

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "AIRA";

/// Largest accepted capacity for the queue event channel
pub const MAX_EVENT_CAPACITY: usize = 65_536;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Notification queue configuration
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Backend connection configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Notification queue configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Lifetime used by the severity shortcuts, in milliseconds (0 = sticky)
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,

    /// Capacity of the queue event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Page size used by list endpoints
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Login email used by the connectivity check
    #[serde(default = "default_login_email")]
    pub login_email: String,

    /// Login password used by the connectivity check
    #[serde(default = "default_login_password", skip_serializing)]
    pub login_password: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
const fn default_duration_ms() -> u64 {
    3000
}

const fn default_event_capacity() -> usize {
    64
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_page_limit() -> u32 {
    5
}

fn default_login_email() -> String {
    "admin@example.com".to_string()
}

fn default_login_password() -> String {
    "admin123".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            page_limit: default_page_limit(),
            login_email: default_login_email(),
            login_password: default_login_password(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from an optional `aira` file and the environment
    ///
    /// Environment overrides use the `AIRA__SECTION__FIELD` form, e.g.
    /// `AIRA__BACKEND__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("aira").required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, still honouring the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot constrain
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] for an empty base URL, a zero
    /// timeout, or an event channel capacity outside
    /// `1..=`[`MAX_EVENT_CAPACITY`].
    pub fn validate(&self) -> crate::Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(crate::Error::configuration("backend.base_url must not be empty"));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(crate::Error::configuration(
                "backend.request_timeout_secs must be greater than zero",
            ));
        }
        if self.notifications.event_capacity == 0 {
            return Err(crate::Error::configuration(
                "notifications.event_capacity must be greater than zero",
            ));
        }
        if self.notifications.event_capacity > MAX_EVENT_CAPACITY {
            return Err(crate::Error::configuration(format!(
                "notifications.event_capacity must be at most {MAX_EVENT_CAPACITY} (got {})",
                self.notifications.event_capacity
            )));
        }
        Ok(())
    }
}
