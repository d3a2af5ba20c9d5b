use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sink::{Notification, NotificationSink};

/// Dispatches notifications without blocking or failing the caller.
///
/// Each notification is sent from its own spawned task. Delivery errors are
/// logged at `warn` and counted, never returned.
#[derive(Clone, Default)]
pub struct Notifier {
    sink: Option<Arc<dyn NotificationSink>>,
}

impl Notifier {
    /// Creates a notifier delivering through `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a notifier that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns true if a sink is attached.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Spawns delivery of `notification` and returns immediately.
    ///
    /// Returns the task handle, or `None` when disabled or when called
    /// outside a tokio runtime.
    pub fn dispatch(&self, notification: Notification) -> Option<JoinHandle<()>> {
        let sink = self.sink.clone()?;

        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime available, dropping notification");
            metrics::counter!("notifications_failed_total").increment(1);
            return None;
        };

        Some(handle.spawn(async move {
            match sink.send(&notification).await {
                Ok(()) => {
                    debug!(title = ?notification.title, "Notification delivered");
                    metrics::counter!("notifications_sent_total").increment(1);
                }
                Err(e) => {
                    warn!(error = %e, title = ?notification.title, "Notification delivery failed");
                    metrics::counter!("notifications_failed_total").increment(1);
                }
            }
        }))
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::InMemorySink;

    #[tokio::test]
    async fn test_dispatch_delivers() {
        let sink = InMemorySink::new();
        let notifier = Notifier::new(Arc::new(sink.clone()));

        let handle = notifier.dispatch(Notification::new("hi")).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let sink = InMemorySink::new();
        sink.set_fail(true);
        let notifier = Notifier::new(Arc::new(sink.clone()));

        let handle = notifier.dispatch(Notification::new("hi")).unwrap();
        // The task itself completes normally.
        handle.await.unwrap();
        assert!(sink.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_drops() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        assert!(notifier.dispatch(Notification::new("hi")).is_none());
    }

    #[test]
    fn test_outside_runtime_drops() {
        let sink = InMemorySink::new();
        let notifier = Notifier::new(Arc::new(sink));
        assert!(notifier.dispatch(Notification::new("hi")).is_none());
    }

    #[tokio::test]
    async fn test_dispatch_does_not_wait_for_delivery() {
        let sink = InMemorySink::new();
        let notifier = Notifier::new(Arc::new(sink.clone()));

        notifier.dispatch(Notification::new("a"));
        notifier.dispatch(Notification::new("b"));

        assert!(sink.wait_for_count(2, Duration::from_secs(2)).await);
    }
}
