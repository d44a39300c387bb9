//! Immutable snapshots and the store that publishes them.
//!
//! A [`Snapshot`] is built whole and published behind an `Arc`; after that
//! its records and counts never change. Staleness is freshness metadata, not
//! content, so it lives in an atomic flag beside the record set.
//!
//! [`SnapshotStore`] holds the current `Arc<Snapshot>` under a lock that is
//! only ever held for a pointer clone or swap, so readers are never blocked
//! behind a slow feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::logging::SUBSYSTEM_STORE;
use crate::models::{ScoredRecord, Tier, TierCounts};

/// A classified record set plus aggregate counts, produced by one poll.
#[derive(Debug)]
pub struct Snapshot {
    records: Vec<ScoredRecord>,
    counts: TierCounts,
    fetched_at: Option<DateTime<Utc>>,
    generation: u64,
    rejected: usize,
    stale: AtomicBool,
}

impl Snapshot {
    /// The initial snapshot before any successful poll.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            counts: TierCounts::default(),
            fetched_at: None,
            generation: 0,
            rejected: 0,
            stale: AtomicBool::new(false),
        }
    }

    /// Build a fresh (non-stale) snapshot. Counts are derived from `records`.
    ///
    /// The generation is assigned by [`SnapshotStore::replace`].
    pub fn new(records: Vec<ScoredRecord>, fetched_at: DateTime<Utc>, rejected: usize) -> Self {
        let counts = TierCounts::from_records(&records);
        Self {
            records,
            counts,
            fetched_at: Some(fetched_at),
            generation: 0,
            rejected,
            stale: AtomicBool::new(false),
        }
    }

    /// Records in feed order.
    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn counts(&self) -> TierCounts {
        self.counts
    }

    pub fn count(&self, tier: Tier) -> usize {
        self.counts.get(tier)
    }

    /// When the producing poll completed. `None` until the first success.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// 0 for the initial empty snapshot, then +1 per successful replace.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Raw records the producing poll rejected.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// True once a poll attempted after this snapshot was published failed.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            generation: self.generation,
            fetched_at: self.fetched_at,
            stale: self.is_stale(),
            counts: self.counts,
            total: self.records.len(),
            rejected: self.rejected,
        }
    }

    fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }
}

/// Serializable view of snapshot metadata for hosts that ship state to a UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub counts: TierCounts,
    pub total: usize,
    pub rejected: usize,
}

/// Owner of the current snapshot. The poller is its only writer.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// Create a store holding [`Snapshot::empty`].
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    /// The current snapshot. Never blocks behind a fetch.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish `snapshot` as the new current snapshot.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let published = Self::swap(&mut self.write_guard(), snapshot);
        log_published(&published);
        published
    }

    /// Publish `snapshot` only if `proceed` still holds once the write lock
    /// is taken. Returns `None` (and publishes nothing) otherwise.
    ///
    /// The poller passes its cancellation check here so that a teardown
    /// racing the end of a fetch cannot slip a write in after the check.
    pub fn replace_if<F>(&self, snapshot: Snapshot, proceed: F) -> Option<Arc<Snapshot>>
    where
        F: FnOnce() -> bool,
    {
        let published = {
            let mut guard = self.write_guard();
            proceed().then(|| Self::swap(&mut guard, snapshot))
        };

        match &published {
            Some(snapshot) => log_published(snapshot),
            None => debug!(subsystem = SUBSYSTEM_STORE, "Snapshot replace abandoned"),
        }
        published
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Arc<Snapshot>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs under the write lock; nothing here may log or block.
    fn swap(slot: &mut Arc<Snapshot>, mut snapshot: Snapshot) -> Arc<Snapshot> {
        snapshot.generation = slot.generation + 1;
        let published = Arc::new(snapshot);
        *slot = Arc::clone(&published);
        published
    }

    /// Flag the current snapshot as stale, keeping its records and
    /// `fetched_at`. Returns the generation that was marked.
    pub fn mark_stale(&self) -> u64 {
        let current = self.current();
        current.mark_stale();
        current.generation
    }
}

fn log_published(snapshot: &Snapshot) {
    info!(
        subsystem = SUBSYSTEM_STORE,
        generation = snapshot.generation,
        record_count = snapshot.records.len(),
        rejected_count = snapshot.rejected,
        "Snapshot published"
    );
}
