//! Change events published by the queue

use crate::NotificationId;
use serde::Serialize;

/// Why a notification left the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissCause {
    /// Closed by the user or caller
    Explicit,
    /// Its auto-dismiss timer elapsed
    Expired,
}

/// A change to the set of visible notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueEvent {
    /// A notification was appended
    Enqueued {
        /// The new notification
        id: NotificationId,
    },

    /// A notification was removed
    Dismissed {
        /// The removed notification
        id: NotificationId,
        /// What removed it
        cause: DismissCause,
    },

    /// The queue was emptied
    Cleared {
        /// Number of notifications removed
        removed: usize,
    },
}

impl QueueEvent {
    /// The notification this event concerns, if it concerns exactly one
    #[must_use]
    pub const fn id(&self) -> Option<NotificationId> {
        match self {
            Self::Enqueued { id } | Self::Dismissed { id, .. } => Some(*id),
            Self::Cleared { .. } => None,
        }
    }
}

/// Callback notified after every queue change
///
/// Called after the queue lock is released, so implementations may read the
/// queue. Keep callbacks short: they run on the thread that made the change,
/// including timer tasks. Changes made concurrently from several threads may
/// arrive out of order; redraw from `NotificationQueue::list` rather than
/// replaying events.
pub trait QueueObserver: Send + Sync {
    /// Handle one change
    fn on_change(&self, event: &QueueEvent);
}

impl<F> QueueObserver for F
where
    F: Fn(&QueueEvent) + Send + Sync,
{
    fn on_change(&self, event: &QueueEvent) {
        self(event);
    }
}
