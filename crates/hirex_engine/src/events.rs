use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

/// One key written or removed through a storage adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    /// Adapter that made the change. Subscribers never see their own writes.
    pub origin: u64,
}

/// Publish/subscribe seam for storage changes between adapters that share a
/// medium (the terminal equivalent of browser tabs).
pub trait StorageEvents: Send + Sync {
    fn publish(&self, change: StorageChange);
    fn subscribe(&self, origin: u64) -> Subscription;
    fn next_origin(&self) -> u64;
}

/// Receiving end of a subscription. Changes are buffered until drained.
pub struct Subscription {
    origin: u64,
    rx: mpsc::Receiver<StorageChange>,
}

impl Subscription {
    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Changes made by other origins since the last drain, oldest first.
    pub fn drain(&self) -> Vec<StorageChange> {
        self.rx
            .try_iter()
            .filter(|change| change.origin != self.origin)
            .collect()
    }
}

/// In-process [`StorageEvents`] implementation over `std::sync::mpsc`.
#[derive(Clone, Default)]
pub struct ChangeBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<StorageChange>>>>,
    origins: Arc<AtomicU64>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl StorageEvents for ChangeBus {
    fn publish(&self, change: StorageChange) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Dropped subscriptions are pruned on the next publish.
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn subscribe(&self, origin: u64) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription { origin, rx }
    }

    fn next_origin(&self) -> u64 {
        self.origins.fetch_add(1, Ordering::Relaxed) + 1
    }
}
