//! AIRA backend probe
//!
//! Runs the connectivity check against the recruiting backend, showing each
//! step as a toast, and offers a few helpers for the notification queue.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use aira_core::Config;
use aira_notify::{NotificationQueue, NotificationRequest};
use aira_probe::{ConnectivityCheck, ProbeError, Result, spawn_renderer, wait_until_empty};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info, warn};

/// Exit code used when interrupted with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Command line interface for the AIRA backend probe
#[derive(Parser)]
#[command(
    name = "aira-probe",
    version = env!("CARGO_PKG_VERSION"),
    about = "Connectivity check for the AIRA recruiting backend",
    long_about = "Checks the REST endpoints the AIRA recruiting console depends on and reports each step as a transient toast notification."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Check that the backend endpoints respond
    Check {
        /// Backend base URL (overrides config)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Login email (overrides config)
        #[arg(long)]
        email: Option<String>,

        /// Login password (overrides config)
        #[arg(long, env = "AIRA_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Longest wait for toasts to auto-dismiss after the check
        #[arg(long, value_name = "MS", default_value_t = 5000)]
        linger_ms: u64,
    },

    /// Validate configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Show a single notification until it is dismissed
    Notify {
        /// Severity (success, error, warning, info)
        severity: String,

        /// Message text
        message: String,

        /// Auto-dismiss delay in milliseconds; 0 keeps it until Ctrl-C
        #[arg(long, allow_negative_numbers = true)]
        duration_ms: Option<i64>,
    },
}

/// Main entry point for the probe
///
/// # Errors
///
/// Returns error if configuration, logging or the selected command fails
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    aira_core::init_logging(&config.logging)?;
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.logging.level,
        "AIRA probe starting"
    );

    match cli.command {
        Commands::Check {
            base_url,
            email,
            password,
            linger_ms,
        } => {
            let mut config = config;
            if let Some(base_url) = base_url {
                config.backend.base_url = base_url;
            }
            if let Some(email) = email {
                config.backend.login_email = email;
            }
            if let Some(password) = password {
                config.backend.login_password = password;
            }
            config.validate()?;
            run_check(&config, Duration::from_millis(linger_ms)).await
        }
        Commands::Config { show } => handle_config_command(&config, show),
        Commands::Notify {
            severity,
            message,
            duration_ms,
        } => run_notify(&config, severity, message, duration_ms).await,
    }
}

/// Load configuration and apply logging flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }

    Ok(config)
}

/// Run the connectivity check with live toasts
async fn run_check(config: &Config, linger: Duration) -> Result<ExitCode> {
    let queue = NotificationQueue::new(&config.notifications)?;
    let check = ConnectivityCheck::from_config(&config.backend, queue.clone())?;
    let renderer = spawn_renderer(queue.clone(), io::stdout());

    let report = tokio::select! {
        report = check.run() => report,
        _ = signal::ctrl_c() => {
            warn!("Interrupted, abandoning check");
            queue.clear();
            renderer.stop().await?;
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    tokio::select! {
        drained = wait_until_empty(&queue, linger) => {
            if !drained {
                debug!(remaining = queue.len(), "Linger elapsed with toasts still visible");
            }
        }
        _ = signal::ctrl_c() => {}
    }
    queue.clear();
    renderer.stop().await?;

    for outcome in &report.outcomes {
        let mark = if outcome.passed { "ok" } else { "FAILED" };
        println!("{:<10} {:<6} {}", outcome.step, mark, outcome.detail);
    }

    if report.passed() {
        info!(base_url = %report.base_url, "All checks passed");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            base_url = %report.base_url,
            failed_step = ?report.failed_step(),
            "Connectivity check failed"
        );
        Ok(ExitCode::FAILURE)
    }
}

/// Handle config command
fn handle_config_command(config: &Config, show: bool) -> Result<ExitCode> {
    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| {
            ProbeError::Core(aira_core::Error::configuration(format!(
                "Failed to serialize configuration: {e}"
            )))
        })?;
        println!("{rendered}");
    } else {
        println!("Configuration is valid");
    }
    Ok(ExitCode::SUCCESS)
}

/// Show one notification through the validated request boundary
async fn run_notify(
    config: &Config,
    severity: String,
    message: String,
    duration_ms: Option<i64>,
) -> Result<ExitCode> {
    let queue = NotificationQueue::new(&config.notifications)?;
    let duration_ms = duration_ms.unwrap_or_else(|| {
        i64::try_from(config.notifications.default_duration_ms).unwrap_or(i64::MAX)
    });

    let id = queue.enqueue_request(NotificationRequest {
        message,
        severity,
        duration_ms,
    })?;
    let lifetime = queue.get(id).map(|n| n.duration()).unwrap_or_default();
    let renderer = spawn_renderer(queue.clone(), io::stdout());

    if lifetime.is_zero() {
        info!("Notification is sticky; press Ctrl-C to dismiss it");
        signal::ctrl_c().await?;
        queue.dismiss(id);
    } else {
        tokio::select! {
            _ = wait_until_empty(&queue, lifetime + Duration::from_secs(1)) => {}
            _ = signal::ctrl_c() => {
                queue.dismiss(id);
            }
        }
    }

    renderer.stop().await?;
    Ok(ExitCode::SUCCESS)
}
