//! Transient notification queue
//!
//! Keeps the visible notifications in display order and owns one fire-once
//! dismissal timer for every notification with a non-zero lifetime. All
//! mutations, timer expiry included, are serialized behind a single lock, so
//! an explicit dismissal racing its own timer removes the notification once.

use crate::notification::ValidRequest;
use crate::{
    DismissCause, Notification, NotificationId, NotificationRequest, NotifyError, QueueEvent,
    QueueObserver, Result,
};
use aira_core::config::MAX_EVENT_CAPACITY;
use aira_core::{NotificationConfig, Severity};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// A queued notification and its pending timer
struct Entry {
    notification: Notification,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    /// Visible notifications keyed by id, in insertion order
    entries: Mutex<IndexMap<NotificationId, Entry>>,

    /// Callback observers
    observers: RwLock<Vec<Arc<dyn QueueObserver>>>,

    /// Broadcast side of the event stream
    events: broadcast::Sender<QueueEvent>,

    /// Runtime that drives dismissal timers
    runtime: Handle,

    /// Lifetime used by the severity shortcuts
    default_duration: Duration,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, entry) in self.entries.get_mut().drain(..) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }
}

/// Thread-safe queue of transient notifications
///
/// Cloning is cheap and every clone refers to the same queue.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<Inner>,
}

impl fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("len", &self.len())
            .field("observers", &self.inner.observers.read().len())
            .field("default_duration", &self.inner.default_duration)
            .finish_non_exhaustive()
    }
}

impl NotificationQueue {
    /// Create a queue whose timers run on the current Tokio runtime
    ///
    /// The runtime must have its time driver enabled.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NoRuntime`] when called outside a Tokio runtime.
    pub fn new(config: &NotificationConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| NotifyError::NoRuntime)?;
        Ok(Self::with_handle(config, runtime))
    }

    /// Create a queue whose timers run on the given runtime
    ///
    /// The event channel capacity is clamped to `1..=`[`MAX_EVENT_CAPACITY`].
    #[must_use]
    pub fn with_handle(config: &NotificationConfig, runtime: Handle) -> Self {
        let capacity = config.event_capacity.clamp(1, MAX_EVENT_CAPACITY);
        let (events, _) = broadcast::channel(capacity);

        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(IndexMap::new()),
                observers: RwLock::new(Vec::new()),
                events,
                runtime,
                default_duration: Duration::from_millis(config.default_duration_ms),
            }),
        }
    }

    /// Append a notification and return its id
    ///
    /// A non-zero `duration` schedules a timer that dismisses the
    /// notification once it elapses; `Duration::ZERO` keeps it until it is
    /// dismissed explicitly. The lifetime is kept in whole milliseconds and
    /// anything shorter than 1 ms is rounded up to it.
    pub fn enqueue(
        &self,
        message: impl Into<String>,
        severity: Severity,
        duration: Duration,
    ) -> NotificationId {
        let notification = Notification::new(message.into(), severity, duration);
        let id = notification.id();
        let duration_ms = notification.duration_ms();
        let event = QueueEvent::Enqueued { id };

        {
            let mut entries = self.inner.entries.lock();
            let timer = (!notification.is_sticky())
                .then(|| self.spawn_timer(id, notification.duration()));
            entries.insert(id, Entry {
                notification,
                timer,
            });
            let _ = self.inner.events.send(event);
        }

        debug!(
            notification_id = %id,
            %severity,
            duration_ms,
            "Enqueued notification"
        );

        self.notify_observers(&event);
        id
    }

    /// Validate an untyped request and enqueue it
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidArgument`] for a negative duration or an
    /// unknown severity tag. Nothing is enqueued in that case.
    pub fn enqueue_request(&self, request: NotificationRequest) -> Result<NotificationId> {
        let valid = ValidRequest::try_from(request).inspect_err(|e| {
            debug!(error = %e, "Rejected notification request");
        })?;

        Ok(self.enqueue(valid.message, valid.severity, valid.duration))
    }

    /// Enqueue with the configured default lifetime
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        self.enqueue(message, severity, self.inner.default_duration)
    }

    /// Enqueue a success notification with the default lifetime
    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Success)
    }

    /// Enqueue an error notification with the default lifetime
    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Error)
    }

    /// Enqueue a warning notification with the default lifetime
    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Warning)
    }

    /// Enqueue an info notification with the default lifetime
    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Info)
    }

    /// Remove a notification and cancel its timer
    ///
    /// Returns `false` when the id is not queued, including when its timer
    /// already removed it.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.remove(id, DismissCause::Explicit)
    }

    /// Remove every notification and cancel every timer
    ///
    /// Returns how many notifications were removed.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut entries = self.inner.entries.lock();
            let removed = entries.len();
            for (_, entry) in entries.drain(..) {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
            }
            if removed > 0 {
                let _ = self.inner.events.send(QueueEvent::Cleared { removed });
            }
            removed
        };

        if removed > 0 {
            debug!(removed, "Cleared notification queue");
            self.notify_observers(&QueueEvent::Cleared { removed });
        }

        removed
    }

    /// Snapshot of the visible notifications in display order
    #[must_use]
    pub fn list(&self) -> Vec<Notification> {
        self.inner
            .entries
            .lock()
            .values()
            .map(|entry| entry.notification.clone())
            .collect()
    }

    /// Look up one visible notification
    #[must_use]
    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.inner
            .entries
            .lock()
            .get(&id)
            .map(|entry| entry.notification.clone())
    }

    /// Whether a notification is still visible
    #[must_use]
    pub fn contains(&self, id: NotificationId) -> bool {
        self.inner.entries.lock().contains_key(&id)
    }

    /// Number of visible notifications
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether no notification is visible
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Lifetime used by [`Self::notify`] and the severity shortcuts
    #[must_use]
    pub fn default_duration(&self) -> Duration {
        self.inner.default_duration
    }

    /// Register a callback observer
    ///
    /// Callbacks run after the queue lock is released. Concurrent changes
    /// may therefore reach them in a different order than [`Self::events`]
    /// reports, which follows the order the changes were applied. Observers
    /// that need the current state should read it with [`Self::list`].
    pub fn subscribe<O>(&self, observer: O)
    where
        O: QueueObserver + 'static,
    {
        self.inner.observers.write().push(Arc::new(observer));
    }

    /// Receive queue events over a broadcast channel
    ///
    /// Events are published under the queue lock, in the order the changes
    /// were applied. Only events published after this call are delivered. A receiver that
    /// falls behind by more than the configured capacity sees `Lagged`.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    fn remove(&self, id: NotificationId, cause: DismissCause) -> bool {
        let event = {
            let mut entries = self.inner.entries.lock();
            let Some(entry) = entries.shift_remove(&id) else {
                return false;
            };

            // An expiring entry is removed from inside its own timer task.
            if cause == DismissCause::Explicit
                && let Some(timer) = entry.timer
            {
                timer.abort();
            }

            let event = QueueEvent::Dismissed { id, cause };
            let _ = self.inner.events.send(event);
            event
        };

        debug!(notification_id = %id, ?cause, "Dismissed notification");

        self.notify_observers(&event);
        true
    }

    fn spawn_timer(&self, id: NotificationId, duration: Duration) -> JoinHandle<()> {
        let queue = Arc::downgrade(&self.inner);

        self.inner.runtime.spawn(async move {
            tokio::time::sleep(duration).await;

            if let Some(inner) = queue.upgrade() {
                Self { inner }.remove(id, DismissCause::Expired);
            }
        })
    }

    fn notify_observers(&self, event: &QueueEvent) {
        let observers = self.inner.observers.read().clone();
        for observer in observers {
            observer.on_change(event);
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use tokio::time::sleep;

    fn queue() -> NotificationQueue {
        NotificationQueue::new(&NotificationConfig::default()).unwrap()
    }

    fn recorder(queue: &NotificationQueue) -> Arc<Mutex<Vec<QueueEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        queue.subscribe(move |event: &QueueEvent| sink.lock().push(*event));
        events
    }

    fn messages(queue: &NotificationQueue) -> Vec<String> {
        queue
            .list()
            .iter()
            .map(|n| n.message().to_string())
            .collect()
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = NotificationQueue::new(&NotificationConfig::default());
        assert_eq!(result.unwrap_err(), NotifyError::NoRuntime);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_preserves_enqueue_order() {
        let queue = queue();
        queue.enqueue("first", Severity::Success, Duration::ZERO);
        queue.enqueue("second", Severity::Error, Duration::ZERO);
        queue.enqueue("third", Severity::Info, Duration::ZERO);

        assert_eq!(messages(&queue), vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_keeps_remaining_order() {
        let queue = queue();
        queue.enqueue("a", Severity::Info, Duration::ZERO);
        let b = queue.enqueue("b", Severity::Info, Duration::ZERO);
        queue.enqueue("c", Severity::Info, Duration::ZERO);

        assert!(queue.dismiss(b));
        queue.enqueue("d", Severity::Info, Duration::ZERO);

        assert_eq!(messages(&queue), vec!["a", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sticky_notification_survives_long_wait() {
        let queue = queue();
        let id = queue.enqueue("x", Severity::Info, Duration::ZERO);

        sleep(Duration::from_secs(24 * 60 * 60)).await;
        assert!(queue.contains(id));

        assert!(queue.dismiss(id));
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_notification_expires() {
        let queue = queue();
        let id = queue.enqueue("x", Severity::Error, Duration::from_millis(100));

        sleep(Duration::from_millis(50)).await;
        assert!(queue.contains(id));

        sleep(Duration::from_millis(100)).await;
        assert!(!queue.contains(id));
        assert!(queue.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_durations_scenario() {
        let queue = queue();
        let first = queue.enqueue("first", Severity::Success, Duration::from_millis(50));
        let second = queue.enqueue("second", Severity::Info, Duration::ZERO);
        let third = queue.enqueue("third", Severity::Warning, Duration::from_millis(200));

        sleep(Duration::from_millis(60)).await;
        let ids: Vec<_> = queue.list().iter().map(Notification::id).collect();
        assert_eq!(ids, vec![second, third]);
        assert!(!queue.contains(first));

        sleep(Duration::from_millis(150)).await;
        let ids: Vec<_> = queue.list().iter().map(Notification::id).collect();
        assert_eq!(ids, vec![second]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_dismiss_is_noop() {
        let queue = queue();
        let events = recorder(&queue);
        let keep = queue.enqueue("keep", Severity::Info, Duration::ZERO);
        let id = queue.enqueue("x", Severity::Info, Duration::from_millis(100));

        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(keep));

        // The cancelled timer must not produce a second removal.
        sleep(Duration::from_millis(500)).await;
        let dismissals = events
            .lock()
            .iter()
            .filter(|e| matches!(e, QueueEvent::Dismissed { .. }))
            .count();
        assert_eq!(dismissals, 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_racing_timer_removes_once() {
        let queue = queue();
        let events = recorder(&queue);
        let id = queue.enqueue("x", Severity::Error, Duration::from_millis(100));

        // Wake exactly when the timer is due; either side may win.
        sleep(Duration::from_millis(100)).await;
        let explicit = queue.dismiss(id);
        sleep(Duration::from_millis(10)).await;

        let recorded = events.lock().clone();
        let dismissals: Vec<_> = recorded
            .iter()
            .filter_map(|e| match e {
                QueueEvent::Dismissed { cause, .. } => Some(*cause),
                _ => None,
            })
            .collect();

        assert_eq!(dismissals.len(), 1);
        let expected = if explicit {
            DismissCause::Explicit
        } else {
            DismissCause::Expired
        };
        assert_eq!(dismissals[0], expected);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_unknown_id_is_noop() {
        let queue = queue();
        let other = self::queue();
        let foreign = other.enqueue("elsewhere", Severity::Info, Duration::ZERO);

        assert!(!queue.dismiss(foreign));
        assert!(queue.is_empty());
        assert_eq!(other.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_timers() {
        let queue = queue();
        let events = recorder(&queue);
        queue.enqueue("a", Severity::Info, Duration::from_millis(50));
        queue.enqueue("b", Severity::Info, Duration::ZERO);
        queue.enqueue("c", Severity::Info, Duration::from_millis(80));

        assert_eq!(queue.clear(), 3);
        assert!(queue.is_empty());

        sleep(Duration::from_millis(200)).await;
        assert!(queue.is_empty());

        let recorded = events.lock().clone();
        assert_eq!(recorded.last(), Some(&QueueEvent::Cleared { removed: 3 }));
        assert!(
            !recorded
                .iter()
                .any(|e| matches!(e, QueueEvent::Dismissed { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_empty_queue_publishes_nothing() {
        let queue = queue();
        let events = recorder(&queue);

        assert_eq!(queue.clear(), 0);
        assert!(events.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_unique_across_ten_thousand_enqueues() {
        let queue = queue();
        let ids: HashSet<_> = (0..10_000)
            .map(|i| queue.enqueue(format!("n{i}"), Severity::Info, Duration::ZERO))
            .collect();

        assert_eq!(ids.len(), 10_000);
        assert_eq!(queue.len(), 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_every_change_in_order() {
        let queue = queue();
        let events = recorder(&queue);

        let a = queue.enqueue("a", Severity::Info, Duration::from_millis(10));
        let b = queue.enqueue("b", Severity::Info, Duration::ZERO);
        sleep(Duration::from_millis(20)).await;
        queue.dismiss(b);

        assert_eq!(
            events.lock().clone(),
            vec![
                QueueEvent::Enqueued { id: a },
                QueueEvent::Enqueued { id: b },
                QueueEvent::Dismissed {
                    id: a,
                    cause: DismissCause::Expired
                },
                QueueEvent::Dismissed {
                    id: b,
                    cause: DismissCause::Explicit
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_may_read_queue() {
        let queue = queue();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::new(Mutex::new(Some(queue.clone())));

        let sink = Arc::clone(&seen);
        let reader = Arc::clone(&handle);
        queue.subscribe(move |_: &QueueEvent| {
            if let Some(queue) = reader.lock().as_ref() {
                sink.lock().push(queue.len());
            }
        });

        let id = queue.enqueue("a", Severity::Info, Duration::ZERO);
        queue.enqueue("b", Severity::Info, Duration::ZERO);
        queue.dismiss(id);

        assert_eq!(seen.lock().clone(), vec![1, 2, 1]);
        handle.lock().take();
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_receiver_gets_events() {
        let queue = queue();
        let mut rx = queue.events();

        let id = queue.enqueue("a", Severity::Success, Duration::from_millis(30));
        assert_eq!(rx.recv().await.unwrap(), QueueEvent::Enqueued { id });
        assert_eq!(
            rx.recv().await.unwrap(),
            QueueEvent::Dismissed {
                id,
                cause: DismissCause::Expired
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_severity_shortcuts_use_default_duration() {
        let queue = queue();
        let id = queue.success("Saved");
        queue.error("Failed");
        queue.warning("Careful");
        queue.info("FYI");

        let notification = queue.get(id).unwrap();
        assert_eq!(notification.duration_ms(), 3000);
        let severities: Vec<_> = queue.list().iter().map(Notification::severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Success,
                Severity::Error,
                Severity::Warning,
                Severity::Info
            ]
        );

        sleep(Duration::from_millis(3001)).await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_request_validates_input() {
        let queue = queue();

        let err = queue
            .enqueue_request(NotificationRequest {
                message: "x".to_string(),
                severity: "info".to_string(),
                duration_ms: -10,
            })
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidArgument { .. }));
        assert!(queue.is_empty());

        let id = queue
            .enqueue_request(NotificationRequest {
                message: "Interview scheduled".to_string(),
                severity: "success".to_string(),
                duration_ms: 0,
            })
            .unwrap();
        assert!(queue.get(id).unwrap().is_sticky());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_millisecond_duration_rounds_up_to_timed() {
        let queue = queue();
        let mut rx = queue.events();
        let id = queue.enqueue("blink", Severity::Info, Duration::from_micros(500));

        let notification = queue.get(id).unwrap();
        assert_eq!(notification.duration_ms(), 1);
        assert!(!notification.is_sticky());

        sleep(Duration::from_millis(5)).await;
        assert!(!queue.contains(id));

        // Expiry never overtakes the enqueue on the event stream.
        assert_eq!(rx.recv().await.unwrap(), QueueEvent::Enqueued { id });
        assert_eq!(
            rx.recv().await.unwrap(),
            QueueEvent::Dismissed {
                id,
                cause: DismissCause::Expired
            }
        );
    }

    #[tokio::test]
    async fn test_oversized_event_capacity_is_clamped() {
        let queue = NotificationQueue::new(&NotificationConfig {
            event_capacity: usize::MAX,
            ..NotificationConfig::default()
        })
        .unwrap();
        let mut rx = queue.events();

        let id = queue.enqueue("x", Severity::Info, Duration::ZERO);
        assert_eq!(rx.recv().await.unwrap(), QueueEvent::Enqueued { id });
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_aborts_timer_task() {
        let metrics = Handle::current().metrics();
        let queue = queue();
        let id = queue.enqueue("a", Severity::Info, Duration::from_secs(60));
        assert_eq!(metrics.num_alive_tasks(), 1);

        assert!(queue.dismiss(id));
        settle().await;
        assert_eq!(metrics.num_alive_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_queue_aborts_pending_timers() {
        let metrics = Handle::current().metrics();
        let queue = queue();
        let mut rx = queue.events();
        queue.enqueue("a", Severity::Info, Duration::from_secs(60));
        queue.enqueue("b", Severity::Info, Duration::from_secs(60));
        queue.enqueue("c", Severity::Info, Duration::ZERO);
        assert_eq!(metrics.num_alive_tasks(), 2);

        drop(queue);
        settle().await;
        // The timers would otherwise sleep for another minute.
        assert_eq!(metrics.num_alive_tasks(), 0);

        for _ in 0..3 {
            assert!(matches!(rx.recv().await, Ok(QueueEvent::Enqueued { .. })));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    proptest! {
        #[test]
        fn test_order_survives_arbitrary_dismissals(
            count in 1usize..40,
            dismiss_mask in proptest::collection::vec(any::<bool>(), 40),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let queue = NotificationQueue::with_handle(
                &NotificationConfig::default(),
                runtime.handle().clone(),
            );

            let ids: Vec<_> = (0..count)
                .map(|i| queue.enqueue(format!("n{i}"), Severity::Info, Duration::ZERO))
                .collect();
            prop_assert_eq!(ids.iter().collect::<HashSet<_>>().len(), count);

            let mut expected = Vec::new();
            for (i, id) in ids.iter().enumerate() {
                if dismiss_mask[i] {
                    prop_assert!(queue.dismiss(*id));
                } else {
                    expected.push(*id);
                }
            }

            let listed: Vec<_> = queue.list().iter().map(Notification::id).collect();
            prop_assert_eq!(listed, expected);
        }
    }
}
