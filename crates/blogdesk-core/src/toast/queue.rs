use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::config::DEFAULT_TOAST_DURATION_MS;

/// Unique for the lifetime of the process; never reused.
pub type ToastId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

struct Inner {
    next_id: AtomicU64,
    default_duration: Duration,
    toasts: watch::Sender<Vec<Toast>>,
}

impl Inner {
    fn remove(&self, id: ToastId) -> bool {
        self.toasts.send_if_modified(|toasts| {
            let before = toasts.len();
            toasts.retain(|t| t.id != id);
            toasts.len() != before
        })
    }
}

/// Ordered collection of visible toasts with timed expiry.
///
/// Cheap to clone; clones share the same toasts. Expiry timers hold only a
/// weak reference, so dropping every clone cancels nothing but makes pending
/// timers no-ops.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Inner>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_millis(DEFAULT_TOAST_DURATION_MS))
    }

    /// Duration used by `success`, `error`, `info` and `add_default`
    pub fn with_default_duration(default_duration: Duration) -> Self {
        let (toasts, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                default_duration,
                toasts,
            }),
        }
    }

    pub fn default_duration(&self) -> Duration {
        self.inner.default_duration
    }

    /// Append a toast and schedule its removal after `duration`.
    ///
    /// Returns immediately; the removal runs on the tokio timer, or on a
    /// plain thread when no runtime is current.
    pub fn add(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> ToastId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            duration,
        };
        debug!(id = id, kind = %kind, duration_ms = duration.as_millis() as u64, "Toast added");
        self.inner.toasts.send_modify(|toasts| toasts.push(toast));

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        match Handle::try_current() {
            Ok(handle) => {
                // Deadline is fixed now, not when the task first runs
                let expiry = {
                    let _guard = handle.enter();
                    tokio::time::sleep(duration)
                };
                handle.spawn(async move {
                    expiry.await;
                    Self::expire(&inner, id);
                });
            }
            Err(_) => {
                warn!(id = id, "No async runtime, expiring toast on a thread");
                std::thread::spawn(move || {
                    std::thread::sleep(duration);
                    Self::expire(&inner, id);
                });
            }
        }

        id
    }

    fn expire(inner: &Weak<Inner>, id: ToastId) {
        if let Some(inner) = inner.upgrade() {
            if inner.remove(id) {
                debug!(id = id, "Toast expired");
            }
        }
    }

    /// `info` toast with the default duration
    pub fn add_default(&self, message: impl Into<String>) -> ToastId {
        self.add(message, ToastKind::Info, self.inner.default_duration)
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.add(message, ToastKind::Success, self.inner.default_duration)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.add(message, ToastKind::Error, self.inner.default_duration)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.add(message, ToastKind::Info, self.inner.default_duration)
    }

    /// Remove a toast early. Unknown ids are ignored and wake no subscriber.
    pub fn remove(&self, id: ToastId) {
        self.inner.remove(id);
    }

    /// Visible toasts in display (insertion) order
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    /// Receiver that is notified whenever the visible toasts change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.toasts.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.toasts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.toasts.borrow().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn ids(queue: &ToastQueue) -> Vec<ToastId> {
        queue.toasts().iter().map(|t| t.id).collect()
    }

    /// Let expiry tasks woken at the current instant run
    async fn settle() {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_insertion_order_and_distinct_ids() {
        let queue = ToastQueue::new();
        let a = queue.add("saved", ToastKind::Success, ms(3000));
        let b = queue.add("saved", ToastKind::Success, ms(3000));
        let c = queue.add("oops", ToastKind::Error, ms(1000));

        let toasts = queue.toasts();
        assert_eq!(toasts.len(), 3);
        assert_eq!(ids(&queue), vec![a, b, c]);
        assert!(a < b && b < c);
        // Identical messages are separate toasts
        assert_eq!(toasts[0].message, toasts[1].message);
        assert_ne!(toasts[0].id, toasts[1].id);
        assert_eq!(toasts[2].kind, ToastKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_start_at_zero_and_are_never_reused() {
        let queue = ToastQueue::new();
        let first = queue.info("one");
        assert_eq!(first, 0);
        queue.remove(first);
        let second = queue.info("two");
        assert_eq!(second, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_exactly_at_duration() {
        let queue = ToastQueue::new();
        let id = queue.add("hello", ToastKind::Info, ms(3000));

        sleep(ms(2999)).await;
        settle().await;
        assert_eq!(ids(&queue), vec![id]);

        sleep(ms(1)).await;
        settle().await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_timers() {
        let queue = ToastQueue::new();
        let long = queue.add("long", ToastKind::Info, ms(5000));
        let _short = queue.add("short", ToastKind::Info, ms(1000));
        let mid = queue.add("mid", ToastKind::Info, ms(2000));

        sleep(ms(1000)).await;
        settle().await;
        assert_eq!(ids(&queue), vec![long, mid]);

        sleep(ms(1000)).await;
        settle().await;
        assert_eq!(ids(&queue), vec![long]);

        sleep(ms(3000)).await;
        settle().await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_preserves_order() {
        let queue = ToastQueue::new();
        let a = queue.info("a");
        let b = queue.info("b");
        let c = queue.info("c");

        queue.remove(b);
        assert_eq!(ids(&queue), vec![a, c]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_unknown_id_is_noop() {
        let queue = ToastQueue::new();
        let a = queue.info("a");
        let rx = queue.subscribe();

        queue.remove(a + 100);
        assert_eq!(ids(&queue), vec![a]);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_removal_then_expiry_is_harmless() {
        let queue = ToastQueue::new();
        let a = queue.add("a", ToastKind::Info, ms(1000));
        let b = queue.add("b", ToastKind::Info, ms(5000));
        queue.remove(a);

        sleep(ms(1000)).await;
        settle().await;
        assert_eq!(ids(&queue), vec![b]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_convenience_wrappers_use_default_duration() {
        let queue = ToastQueue::with_default_duration(ms(500));
        queue.success("ok");
        queue.error("bad");
        queue.info("fyi");
        queue.add_default("plain");

        let kinds: Vec<ToastKind> = queue.toasts().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![ToastKind::Success, ToastKind::Error, ToastKind::Info, ToastKind::Info]
        );
        assert!(queue.toasts().iter().all(|t| t.duration == ms(500)));

        sleep(ms(500)).await;
        settle().await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_duration_is_three_seconds() {
        let queue = ToastQueue::new();
        assert_eq!(queue.default_duration(), ms(3000));
        queue.info("hi");

        sleep(ms(2999)).await;
        settle().await;
        assert_eq!(queue.len(), 1);

        sleep(ms(1)).await;
        settle().await;
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_changes() {
        let queue = ToastQueue::new();
        let mut rx = queue.subscribe();

        let id = queue.add("hello", ToastKind::Info, ms(100));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        // Expiry also notifies
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().iter().all(|t| t.id != id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let queue = ToastQueue::new();
        let other = queue.clone();
        let id = other.info("shared");
        assert_eq!(ids(&queue), vec![id]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_queue_with_pending_timer() {
        let queue = ToastQueue::new();
        queue.info("bye");
        drop(queue);
        // Timer fires against a dropped queue without incident
        sleep(ms(3000)).await;
        settle().await;
    }

    #[test]
    fn test_add_outside_runtime_still_expires() {
        let queue = ToastQueue::new();
        let id = queue.add("offline", ToastKind::Info, ms(50));
        assert_eq!(queue.toasts().len(), 1);
        assert_eq!(queue.toasts()[0].id, id);

        std::thread::sleep(ms(300));
        assert!(queue.toasts().is_empty());
    }

    #[test]
    fn test_toast_kind_display_and_serde() {
        assert_eq!(ToastKind::Success.to_string(), "success");
        assert_eq!(ToastKind::default(), ToastKind::Info);
        let kind: ToastKind = serde_json::from_str(r#""error""#).unwrap();
        assert_eq!(kind, ToastKind::Error);
    }
}
