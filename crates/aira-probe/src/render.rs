//! Terminal toast renderer
//!
//! The renderer never mutates the queue. It redraws a snapshot from
//! [`NotificationQueue::list`] after every queue event.

use aira_notify::{Notification, NotificationQueue, Severity};
use crossterm::style::{Color, Stylize};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Visual treatment of one severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastStyle {
    /// Leading glyph
    pub icon: &'static str,
    /// Upper-case severity label
    pub label: &'static str,
    /// Accent colour for the icon and label
    pub color: Color,
}

impl ToastStyle {
    /// Style for `severity`
    #[must_use]
    pub const fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Success => Self {
                icon: "✔",
                label: "SUCCESS",
                color: Color::Green,
            },
            Severity::Error => Self {
                icon: "✖",
                label: "ERROR",
                color: Color::Red,
            },
            Severity::Warning => Self {
                icon: "!",
                label: "WARNING",
                color: Color::Yellow,
            },
            Severity::Info => Self {
                icon: "i",
                label: "INFO",
                color: Color::Blue,
            },
        }
    }
}

/// Render one toast as a single line
#[must_use]
pub fn render_toast(notification: &Notification) -> String {
    let style = ToastStyle::for_severity(notification.severity());
    let lifetime = if notification.is_sticky() {
        "sticky".to_string()
    } else {
        format!("{:.1}s", notification.duration().as_secs_f64())
    };

    format!(
        "{} {} {} ({lifetime})",
        style.icon.with(style.color).bold(),
        format!("[{}]", style.label).with(style.color),
        notification.message(),
    )
}

/// Render a snapshot of the queue, oldest toast first
///
/// Every frame ends with a blank line.
#[must_use]
pub fn render_frame(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return "(no notifications)\n\n".to_string();
    }

    let mut frame = String::new();
    for notification in notifications {
        frame.push_str(&render_toast(notification));
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// Handle to a running renderer task
#[derive(Debug)]
pub struct Renderer<W> {
    stop: oneshot::Sender<()>,
    task: JoinHandle<io::Result<W>>,
}

impl<W> Renderer<W> {
    /// Stop redrawing and hand back the writer
    ///
    /// Events still pending at the time of the call produce one final frame.
    ///
    /// # Errors
    ///
    /// Returns an error if a write failed or the task panicked.
    pub async fn stop(self) -> io::Result<W> {
        // The task may already have finished on a write error.
        let _ = self.stop.send(());
        self.task.await.map_err(io::Error::other)?
    }
}

/// Draw the queue to `writer` now and after every queue event
///
/// Must be called from within a Tokio runtime.
pub fn spawn_renderer<W>(queue: NotificationQueue, mut writer: W) -> Renderer<W>
where
    W: Write + Send + 'static,
{
    // Subscribe before the first draw so no change slips between the two.
    let mut events = queue.events();
    let (stop, mut stopped) = oneshot::channel();

    let task = tokio::spawn(async move {
        draw(&mut writer, &queue)?;

        loop {
            tokio::select! {
                _ = &mut stopped => {
                    let pending = !matches!(events.try_recv(), Err(TryRecvError::Empty | TryRecvError::Closed));
                    if pending {
                        draw(&mut writer, &queue)?;
                    }
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        trace!(?event, "Redrawing toasts");
                        draw(&mut writer, &queue)?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Renderer lagged behind queue events");
                        draw(&mut writer, &queue)?;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        writer.flush()?;
        Ok(writer)
    });

    Renderer { stop, task }
}

fn draw<W: Write>(writer: &mut W, queue: &NotificationQueue) -> io::Result<()> {
    writer.write_all(render_frame(&queue.list()).as_bytes())?;
    writer.flush()
}

/// Wait until the queue has no visible notifications
///
/// Returns `false` if `timeout` elapsed first.
pub async fn wait_until_empty(queue: &NotificationQueue, timeout: Duration) -> bool {
    let mut events = queue.events();

    let drained = async {
        loop {
            if queue.is_empty() {
                return;
            }
            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            }
        }
    };

    tokio::time::timeout(timeout, drained).await.is_ok() && queue.is_empty()
}
