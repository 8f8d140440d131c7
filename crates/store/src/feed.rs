//! Full-collection change feed.
//!
//! Every store mutation publishes a fresh, immutable [`Snapshot`] of the whole
//! collection. Snapshots are replaced wholesale and never mutated in place, so
//! a consumer holding one can read it without locking.
//!
//! Built on `tokio::sync::watch`: a slow consumer sees only the latest
//! snapshot, never a backlog. Since each snapshot is the complete collection,
//! nothing is lost by skipping intermediate ones.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use salesbook_invoicing::Invoice;

/// Immutable view of the full invoice collection, newest first.
pub type Snapshot = Arc<[Invoice]>;

/// Publisher side, owned by a store.
#[derive(Debug)]
pub struct ChangeFeed {
    tx: watch::Sender<Snapshot>,
}

impl ChangeFeed {
    pub fn new(initial: Vec<Invoice>) -> Self {
        let (tx, _rx) = watch::channel(Snapshot::from(initial));
        Self { tx }
    }

    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Replace the collection and wake every subscriber.
    pub fn publish(&self, next: Vec<Invoice>) {
        let count = next.len();
        self.tx.send_replace(Snapshot::from(next));
        tracing::debug!(count, subscribers = self.tx.receiver_count(), "published snapshot");
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Consumer side of a [`ChangeFeed`].
#[derive(Debug)]
pub struct Subscription {
    rx: Option<watch::Receiver<Snapshot>>,
}

impl Subscription {
    /// The latest snapshot; `None` once unsubscribed.
    pub fn current(&mut self) -> Option<Snapshot> {
        self.rx.as_mut().map(|rx| rx.borrow_and_update().clone())
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once unsubscribed or when the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        let rx = self.rx.as_mut()?;
        rx.changed().await.ok()?;
        Some(rx.borrow_and_update().clone())
    }

    /// Stop delivery. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

/// Handle for a callback-driven subscription running on a tokio task.
///
/// The callback receives the current snapshot immediately, then one snapshot
/// per change. Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct SubscriptionHandle {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Must be called within a tokio runtime.
    pub fn spawn<F>(mut subscription: Subscription, mut callback: F) -> Self
    where
        F: FnMut(Snapshot) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let task = tokio::spawn(async move {
            if let Some(snapshot) = subscription.current() {
                if flag.load(Ordering::Acquire) {
                    callback(snapshot);
                }
            }
            while let Some(snapshot) = subscription.changed().await {
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                callback(snapshot);
            }
        });

        Self {
            active,
            task: Some(task),
        }
    }

    /// Stop callback delivery. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn subscription_sees_published_snapshots() {
        let feed = ChangeFeed::new(Vec::new());
        let mut sub = feed.subscribe();
        assert_eq!(sub.current().unwrap().len(), 0);

        feed.publish(Vec::new());
        let next = tokio::time::timeout(Duration::from_secs(1), sub.changed())
            .await
            .unwrap();
        assert!(next.is_some());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_stops_delivery() {
        let feed = ChangeFeed::new(Vec::new());
        let mut sub = feed.subscribe();
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        feed.publish(Vec::new());
        assert!(sub.changed().await.is_none());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn callback_handle_delivers_initial_then_changes() {
        let feed = ChangeFeed::new(Vec::new());
        let calls = Arc::new(Mutex::new(0usize));
        let seen = Arc::clone(&calls);
        let mut handle = SubscriptionHandle::spawn(feed.subscribe(), move |_snapshot| {
            *seen.lock().unwrap() += 1;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        feed.publish(Vec::new());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*calls.lock().unwrap(), 2);

        handle.unsubscribe();
        handle.unsubscribe();
        feed.publish(Vec::new());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
