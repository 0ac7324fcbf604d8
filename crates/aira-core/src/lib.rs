//! Core types and utilities for the AIRA notification toolkit

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{BackendConfig, Config, LoggingConfig, NotificationConfig};
pub use error::{Error, Result};
pub use types::Severity;
pub use validation::{Credentials, is_valid_email};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level. The format is
/// JSON when `logging.format` is `"json"`, pretty otherwise. Logs go to
/// stderr so stdout stays free for rendered output.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if logging.format.eq_ignore_ascii_case("json") {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    installed.map_err(|e| Error::configuration(format!("Failed to initialize logging: {e}")))
}
