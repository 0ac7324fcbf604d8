//! Notification data types

use aira_core::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::{NotifyError, Result};

/// Opaque notification identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A transient message shown to the user
///
/// Immutable once created; the queue only ever inserts or removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    id: NotificationId,
    message: String,
    severity: Severity,
    duration_ms: u64,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// A non-zero `duration` under one millisecond rounds up to 1 ms, so only
    /// `Duration::ZERO` yields a sticky notification.
    pub(crate) fn new(message: String, severity: Severity, duration: Duration) -> Self {
        let duration_ms = match u64::try_from(duration.as_millis()) {
            Ok(0) if !duration.is_zero() => 1,
            Ok(ms) => ms,
            Err(_) => u64::MAX,
        };

        Self {
            id: NotificationId::new(),
            message,
            severity,
            duration_ms,
            created_at: Utc::now(),
        }
    }

    /// Identifier assigned at creation
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Display text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity tag
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Auto-dismiss delay in milliseconds; `0` means sticky
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Auto-dismiss delay
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Whether only an explicit dismissal can remove this notification
    #[must_use]
    pub const fn is_sticky(&self) -> bool {
        self.duration_ms == 0
    }

    /// When the notification entered the queue
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Untyped notification input, as received from a CLI or a JSON payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Display text
    pub message: String,

    /// Severity tag (`success`, `error`, `warning` or `info`)
    pub severity: String,

    /// Auto-dismiss delay in milliseconds; `0` means sticky
    pub duration_ms: i64,
}

/// A request that passed boundary validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidRequest {
    pub(crate) message: String,
    pub(crate) severity: Severity,
    pub(crate) duration: Duration,
}

impl TryFrom<NotificationRequest> for ValidRequest {
    type Error = NotifyError;

    fn try_from(request: NotificationRequest) -> Result<Self> {
        let severity: Severity = request.severity.parse()?;
        let duration_ms = u64::try_from(request.duration_ms).map_err(|_| {
            NotifyError::invalid_argument(
                "duration_ms",
                format!("must not be negative (got {})", request.duration_ms),
            )
        })?;

        Ok(Self {
            message: request.message,
            severity,
            duration: Duration::from_millis(duration_ms),
        })
    }
}
