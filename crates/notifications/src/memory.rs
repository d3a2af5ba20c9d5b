use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::error::{NotificationError, Result};
use crate::sink::{Notification, NotificationSink};

/// In-memory sink for testing.
///
/// Records every notification it receives. Can be told to fail so callers
/// can check that delivery errors are swallowed.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: Arc<AtomicBool>,
    delivered: Arc<Notify>,
}

impl InMemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every send.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the notifications received so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Waits until at least `count` notifications have been recorded.
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for_count(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.delivered.notified();
                if self.sent.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[async_trait]
impl NotificationSink for InMemorySink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery("sink configured to fail".to_string()));
        }

        self.sent.lock().await.push(notification.clone());
        self.delivered.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_notifications() {
        let sink = InMemorySink::new();
        sink.send(&Notification::new("one")).await.unwrap();
        sink.send(&Notification::new("two")).await.unwrap();

        let sent = sink.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].message, "two");
    }

    #[tokio::test]
    async fn test_fail_mode() {
        let sink = InMemorySink::new();
        sink.set_fail(true);

        assert!(sink.send(&Notification::new("one")).await.is_err());
        assert!(sink.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_count() {
        let sink = InMemorySink::new();
        let writer = sink.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.send(&Notification::new("late")).await.unwrap();
        });

        assert!(sink.wait_for_count(1, Duration::from_secs(2)).await);
        assert!(!sink.wait_for_count(2, Duration::from_millis(50)).await);
    }
}
