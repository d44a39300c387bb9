//! Snapshot-change callbacks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::error;

use riskwatch_core::logging::SUBSYSTEM_POLLER;
use riskwatch_core::Snapshot;

/// Callback invoked with each newly published snapshot.
pub type SnapshotCallback = Arc<dyn Fn(Arc<Snapshot>) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of snapshot-change callbacks.
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, SnapshotCallback)>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Arc<Snapshot>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invoke every callback in registration order.
    ///
    /// The list is copied out first so callbacks may (un)subscribe. A
    /// panicking callback is logged and skipped.
    pub fn notify(&self, snapshot: &Arc<Snapshot>) {
        let callbacks: Vec<(SubscriptionId, SnapshotCallback)> = self.lock().clone();
        for (id, callback) in callbacks {
            let snapshot = Arc::clone(snapshot);
            if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
                error!(
                    subsystem = SUBSYSTEM_POLLER,
                    subscription = id.0,
                    "Snapshot subscriber panicked"
                );
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, SnapshotCallback)>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
