//! Feed poller: single-flight fetch, validate, classify, publish.
//!
//! ```text
//! Idle -> Fetching -> (Succeeded | Failed) -> Idle
//! ```
//!
//! A tick only starts a fetch from `Idle`; ticks that arrive while a fetch
//! is in flight are dropped, not queued. A failed fetch never touches
//! records: it flags the current snapshot stale and waits for the next tick.
//! There is no retry or backoff.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use riskwatch_core::logging::SUBSYSTEM_POLLER;
use riskwatch_core::{
    validate_batch, Error, EventBus, RawRecord, Result, RiskEvent, RiskWatchConfig, Snapshot,
    SnapshotStore,
};

use crate::feed::FeedClient;
use crate::subscribers::Subscribers;

/// Poller state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum PollerState {
    Idle = 0,
    Fetching = 1,
    Succeeded = 2,
    Failed = 3,
}

impl PollerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PollerState::Fetching,
            2 => PollerState::Succeeded,
            3 => PollerState::Failed,
            _ => PollerState::Idle,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new snapshot was published.
    Published {
        generation: u64,
        records: usize,
        rejected: usize,
    },
    /// The fetch failed or timed out; the current snapshot is now stale.
    Failed(String),
    /// Another fetch was in flight; nothing happened.
    Skipped,
    /// The poller was torn down; any fetched data was discarded.
    Cancelled,
}

/// Counters accumulated over the poller's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    /// Ticks that started a fetch.
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Ticks dropped by the single-flight guard.
    pub skipped: u64,
    /// Raw records rejected by validation across all successful polls.
    pub rejected_records: u64,
}

#[derive(Default)]
struct PollCounters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
    rejected_records: AtomicU64,
}

impl PollCounters {
    fn snapshot(&self) -> PollStats {
        PollStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            rejected_records: self.rejected_records.load(Ordering::Relaxed),
        }
    }
}

/// Resets the state to `Idle` when a tick ends, however it ends.
///
/// Dropping a tick future mid-fetch must not wedge the poller in `Fetching`.
struct FlightGuard<'a> {
    state: &'a AtomicU8,
}

impl<'a> FlightGuard<'a> {
    fn try_acquire(state: &'a AtomicU8) -> Option<Self> {
        state
            .compare_exchange(
                PollerState::Idle as u8,
                PollerState::Fetching as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| Self { state })
    }

    fn finish(&self, state: PollerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.state.store(PollerState::Idle as u8, Ordering::Release);
    }
}

/// Polls a feed and publishes snapshots into a [`SnapshotStore`].
///
/// The poller is the store's only writer.
pub struct Poller {
    feed: Arc<dyn FeedClient>,
    store: Arc<SnapshotStore>,
    subscribers: Arc<Subscribers>,
    events: Arc<EventBus>,
    config: RiskWatchConfig,
    state: AtomicU8,
    counters: PollCounters,
    cancel: CancellationToken,
    started: AtomicBool,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        store: Arc<SnapshotStore>,
        subscribers: Arc<Subscribers>,
        events: Arc<EventBus>,
        config: RiskWatchConfig,
    ) -> Self {
        Self {
            feed,
            store,
            subscribers,
            events,
            config,
            state: AtomicU8::new(PollerState::Idle as u8),
            counters: PollCounters::default(),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            loop_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollerState {
        PollerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> PollStats {
        self.counters.snapshot()
    }

    /// Begin teardown. Any fetch still in flight is abandoned and its data
    /// dropped; the publish check runs under the store's write lock, so no
    /// replace can start once the token is set.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one single-flight poll attempt.
    pub async fn tick(&self) -> TickOutcome {
        if self.cancel.is_cancelled() {
            return TickOutcome::Cancelled;
        }

        let Some(flight) = FlightGuard::try_acquire(&self.state) else {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(subsystem = SUBSYSTEM_POLLER, "Poll tick dropped, fetch already in flight");
            self.events.emit(RiskEvent::PollSkipped);
            return TickOutcome::Skipped;
        };

        self.counters.attempts.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        let timeout = self.config.feed_timeout();

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = tokio::time::timeout(timeout, self.feed.fetch()) => Some(result),
        };

        let outcome = match fetched {
            None => TickOutcome::Cancelled,
            Some(Ok(Ok(raws))) => self.publish(&flight, raws, started),
            Some(Ok(Err(e))) => self.fail(&flight, e, started),
            Some(Err(_elapsed)) => {
                self.fail(&flight, Error::FeedTimeout(timeout.as_secs()), started)
            }
        };

        if outcome == TickOutcome::Cancelled {
            info!(subsystem = SUBSYSTEM_POLLER, "In-flight poll discarded after cancellation");
        }
        outcome
    }

    fn publish(
        &self,
        flight: &FlightGuard<'_>,
        raws: Vec<RawRecord>,
        started: Instant,
    ) -> TickOutcome {
        let batch = validate_batch(raws, &self.config.thresholds);
        let rejected = batch.rejected_count();
        let snapshot = Snapshot::new(batch.records, Utc::now(), rejected);

        let cancel = &self.cancel;
        let Some(published) = self.store.replace_if(snapshot, || !cancel.is_cancelled()) else {
            return TickOutcome::Cancelled;
        };
        flight.finish(PollerState::Succeeded);

        self.counters.successes.fetch_add(1, Ordering::Relaxed);
        self.counters
            .rejected_records
            .fetch_add(rejected as u64, Ordering::Relaxed);

        if rejected > 0 {
            warn!(
                subsystem = SUBSYSTEM_POLLER,
                generation = published.generation(),
                rejected_count = rejected,
                "Feed delivered malformed records"
            );
        }
        info!(
            subsystem = SUBSYSTEM_POLLER,
            generation = published.generation(),
            record_count = published.len(),
            rejected_count = rejected,
            duration_ms = started.elapsed().as_millis() as u64,
            "Poll succeeded"
        );

        self.events.emit(RiskEvent::SnapshotPublished {
            generation: published.generation(),
            records: published.len(),
            rejected,
            counts: published.counts(),
        });
        self.subscribers.notify(&published);

        TickOutcome::Published {
            generation: published.generation(),
            records: published.len(),
            rejected,
        }
    }

    fn fail(&self, flight: &FlightGuard<'_>, err: Error, started: Instant) -> TickOutcome {
        if self.cancel.is_cancelled() {
            return TickOutcome::Cancelled;
        }
        flight.finish(PollerState::Failed);

        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        let stale_generation = self.store.mark_stale();
        let message = err.to_string();

        warn!(
            subsystem = SUBSYSTEM_POLLER,
            error = %message,
            generation = stale_generation,
            stale = true,
            duration_ms = started.elapsed().as_millis() as u64,
            "Poll failed, keeping last good snapshot"
        );

        self.events.emit(RiskEvent::PollFailed {
            error: message.clone(),
            stale_generation,
        });

        TickOutcome::Failed(message)
    }

    /// Spawn the periodic poll loop and return a handle to stop it.
    ///
    /// The first tick fires immediately. Each tick runs in its own task so a
    /// slow fetch never delays the timer; overlapping ticks hit the
    /// single-flight guard and are dropped.
    ///
    /// At most one loop ever runs per poller. Later calls return a handle to
    /// the same loop, and shutting down any handle stops it.
    pub fn start(self: Arc<Self>) -> PollerHandle {
        {
            let mut slot = self.loop_slot();
            if self.started.swap(true, Ordering::AcqRel) {
                debug!(subsystem = SUBSYSTEM_POLLER, "Poller already started, reusing loop");
            } else {
                let poller = Arc::clone(&self);
                *slot = Some(tokio::spawn(async move { poller.run().await }));
            }
        }

        PollerHandle { poller: self }
    }

    fn loop_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.loop_task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(skip(self), fields(subsystem = SUBSYSTEM_POLLER))]
    async fn run(self: Arc<Self>) {
        if !self.config.enabled {
            info!("Poller is disabled, not starting");
            return;
        }

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            feed_timeout_secs = self.config.feed_timeout_secs,
            "Poller started"
        );
        self.events.emit(RiskEvent::PollerStarted {
            poll_interval_secs: self.config.poll_interval_secs,
        });

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Poller received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    let poller = Arc::clone(&self);
                    in_flight.spawn(async move { poller.tick().await });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = ?e, "Poll task panicked");
                    }
                }
            }
        }

        // In-flight ticks observe the cancelled token and discard their data.
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = ?e, "Poll task panicked during shutdown");
            }
        }

        self.events.emit(RiskEvent::PollerStopped);
        info!("Poller stopped");
    }
}

/// Handle for a running poll loop.
pub struct PollerHandle {
    poller: Arc<Poller>,
}

impl PollerHandle {
    /// Cancel the loop and wait for it and any in-flight poll to finish.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        self.poller.cancel();

        let join = self.poller.loop_slot().take();
        if let Some(join) = join {
            join.await
                .map_err(|e| Error::Internal(format!("Poller task failed: {e}")))?;
        }
        Ok(())
    }

    pub fn state(&self) -> PollerState {
        self.poller.state()
    }

    pub fn stats(&self) -> PollStats {
        self.poller.stats()
    }

    /// Whether the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.poller
            .loop_slot()
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }
}
