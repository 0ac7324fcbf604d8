//! Transient notification queue for the AIRA recruiting console
//!
//! A [`NotificationQueue`] holds the toasts currently on screen, in the order
//! they were raised. Each notification may carry a lifetime, after which the
//! queue dismisses it on its own; the rendering layer only reads snapshots
//! and forwards explicit close actions.
//!
//! ```no_run
//! use aira_core::{NotificationConfig, Severity};
//! use aira_notify::NotificationQueue;
//! use std::time::Duration;
//!
//! # async fn demo() -> aira_notify::Result<()> {
//! let queue = NotificationQueue::new(&NotificationConfig::default())?;
//! let id = queue.enqueue("Candidate saved", Severity::Success, Duration::from_secs(3));
//! assert_eq!(queue.list().len(), 1);
//! queue.dismiss(id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod error;
pub mod event;
pub mod notification;
pub mod queue;

// Re-export commonly used types
pub use aira_core::Severity;
pub use error::{NotifyError, Result};
pub use event::{DismissCause, QueueEvent, QueueObserver};
pub use notification::{Notification, NotificationId, NotificationRequest};
pub use queue::NotificationQueue;
