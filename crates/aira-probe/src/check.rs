//! Sequential backend connectivity check
//!
//! Walks the endpoints the recruiting console depends on, in order, and
//! raises a toast for every step. The first failing step ends the run.

use crate::{ApiClient, ProbeError, Result};
use aira_core::{BackendConfig, Credentials};
use aira_notify::NotificationQueue;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// One step of the connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `GET /`
    Root,
    /// `POST /auth/login`
    Login,
    /// `GET /auth/me`
    Profile,
    /// `GET /candidates`
    Candidates,
    /// `GET /calls`
    Calls,
    /// `GET /candidates/stats`
    Stats,
}

impl Step {
    /// Every step, in execution order
    pub const ALL: [Self; 6] = [
        Self::Root,
        Self::Login,
        Self::Profile,
        Self::Candidates,
        Self::Calls,
        Self::Stats,
    ];

    /// Short machine name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Login => "login",
            Self::Profile => "profile",
            Self::Candidates => "candidates",
            Self::Calls => "calls",
            Self::Stats => "stats",
        }
    }

    /// Human readable title used in toasts
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Root => "Root endpoint",
            Self::Login => "Login",
            Self::Profile => "Profile",
            Self::Candidates => "Candidates",
            Self::Calls => "Calls",
            Self::Stats => "Dashboard stats",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Which step ran
    pub step: Step,
    /// Whether it succeeded
    pub passed: bool,
    /// What was observed, or why it failed
    pub detail: String,
}

/// Outcome of a full check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Backend that was checked
    pub base_url: String,
    /// Outcomes of the steps that ran, in order
    pub outcomes: Vec<StepOutcome>,
}

impl ProbeReport {
    /// Whether every step ran and passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcomes.len() == Step::ALL.len() && self.outcomes.iter().all(|o| o.passed)
    }

    /// The step that ended the run, if any
    #[must_use]
    pub fn failed_step(&self) -> Option<Step> {
        self.outcomes.iter().find(|o| !o.passed).map(|o| o.step)
    }
}

/// Runs the connectivity check and reports through a notification queue
#[derive(Debug)]
pub struct ConnectivityCheck {
    client: ApiClient,
    credentials: Credentials,
    page_limit: u32,
    queue: NotificationQueue,
}

impl ConnectivityCheck {
    /// Create a check against `client`
    #[must_use]
    pub const fn new(
        client: ApiClient,
        credentials: Credentials,
        page_limit: u32,
        queue: NotificationQueue,
    ) -> Self {
        Self {
            client,
            credentials,
            page_limit,
            queue,
        }
    }

    /// Create a check from the backend configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig, queue: NotificationQueue) -> Result<Self> {
        Ok(Self::new(
            ApiClient::from_config(config)?,
            Credentials::new(config.login_email.clone(), config.login_password.clone()),
            config.page_limit,
            queue,
        ))
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(mut self) -> ProbeReport {
        let mut report = ProbeReport {
            base_url: self.client.base_url().to_string(),
            outcomes: Vec::with_capacity(Step::ALL.len()),
        };
        info!(base_url = %report.base_url, "Starting connectivity check");

        let root = self.client.root().await.map(|body| {
            body.get("message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| "reachable".to_string(), str::to_string)
        });
        if !self.record(&mut report, Step::Root, root) {
            return report;
        }

        match self.client.login(&self.credentials).await {
            Ok(login) => {
                self.record(
                    &mut report,
                    Step::Login,
                    Ok(format!("logged in as {}", login.user.name)),
                );
                self.client = self.client.clone().with_token(login.access_token);
            }
            Err(e) => {
                self.record(&mut report, Step::Login, Err(e));
                return report;
            }
        }

        let profile = self
            .client
            .profile()
            .await
            .map(|p| format!("{} <{}> ({})", p.name, p.email, p.role));
        if !self.record(&mut report, Step::Profile, profile) {
            return report;
        }

        let candidates = self
            .client
            .candidates(self.page_limit)
            .await
            .map(|page| format!("{} returned of {} total", page.candidates.len(), page.total));
        if !self.record(&mut report, Step::Candidates, candidates) {
            return report;
        }

        let calls = self
            .client
            .calls(self.page_limit)
            .await
            .map(|page| format!("{} returned of {} total", page.calls.len(), page.total));
        if !self.record(&mut report, Step::Calls, calls) {
            return report;
        }

        let stats = self.client.candidate_stats().await.map(|s| {
            format!(
                "{} candidates, {} interested, {} not interested",
                s.total_candidates, s.interested_candidates, s.not_interested_candidates
            )
        });
        self.record(&mut report, Step::Stats, stats);

        if report.passed() {
            info!(base_url = %report.base_url, "Connectivity check passed");
        }
        report
    }

    /// Append the outcome of `step` to the report and raise its toast
    fn record(&self, report: &mut ProbeReport, step: Step, result: Result<String>) -> bool {
        let outcome = match result {
            Ok(detail) => {
                info!(step = %step, detail = %detail, "Step passed");
                self.queue.success(format!("{}: {detail}", step.title()));
                StepOutcome {
                    step,
                    passed: true,
                    detail,
                }
            }
            Err(e) => {
                let detail = self.describe_failure(&e);
                warn!(step = %step, error = %e, "Step failed");
                self.queue.error(format!("{} failed: {detail}", step.title()));
                StepOutcome {
                    step,
                    passed: false,
                    detail,
                }
            }
        };

        let passed = outcome.passed;
        report.outcomes.push(outcome);
        passed
    }

    fn describe_failure(&self, error: &ProbeError) -> String {
        if error.is_connect() {
            return format!(
                "network error, is the backend running at {}?",
                self.client.base_url()
            );
        }
        match error {
            ProbeError::UnexpectedStatus { status, body, .. } => format!("HTTP {status}: {body}"),
            other => other.to_string(),
        }
    }
}
