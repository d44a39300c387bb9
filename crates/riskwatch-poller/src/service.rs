//! Service facade consumed by dashboards and reports.

use std::sync::Arc;

use tokio::sync::broadcast;

use riskwatch_core::{
    query, to_csv, EventBus, EventEnvelope, Query, QueryResult, Result, RiskWatchConfig, Snapshot,
    SnapshotStore, SnapshotSummary,
};

use crate::feed::FeedClient;
use crate::poller::{PollStats, Poller, PollerHandle, PollerState, TickOutcome};
use crate::subscribers::{Subscribers, SubscriptionId};

/// Shared polling, classification and query service.
///
/// One instance replaces the per-view polling loops: every consumer reads
/// the same atomically published snapshot.
pub struct RiskWatch {
    config: RiskWatchConfig,
    store: Arc<SnapshotStore>,
    subscribers: Arc<Subscribers>,
    events: Arc<EventBus>,
    poller: Arc<Poller>,
}

/// Builder for [`RiskWatch`].
pub struct RiskWatchBuilder {
    feed: Arc<dyn FeedClient>,
    config: RiskWatchConfig,
}

impl RiskWatchBuilder {
    pub fn with_config(mut self, config: RiskWatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and wire the service together.
    pub fn build(self) -> Result<RiskWatch> {
        self.config.validate()?;

        let store = Arc::new(SnapshotStore::new());
        let subscribers = Arc::new(Subscribers::new());
        let events = Arc::new(EventBus::new(self.config.event_capacity));
        let poller = Arc::new(Poller::new(
            self.feed,
            Arc::clone(&store),
            Arc::clone(&subscribers),
            Arc::clone(&events),
            self.config.clone(),
        ));

        Ok(RiskWatch {
            config: self.config,
            store,
            subscribers,
            events,
            poller,
        })
    }
}

impl RiskWatch {
    pub fn builder(feed: Arc<dyn FeedClient>) -> RiskWatchBuilder {
        RiskWatchBuilder {
            feed,
            config: RiskWatchConfig::default(),
        }
    }

    pub fn config(&self) -> &RiskWatchConfig {
        &self.config
    }

    /// The current snapshot, including its `stale` flag and `fetched_at`.
    pub fn get_snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    pub fn summary(&self) -> SnapshotSummary {
        self.store.current().summary()
    }

    /// Filter and paginate the current snapshot.
    pub fn query(&self, q: &Query) -> QueryResult {
        query::run(&self.store.current(), q)
    }

    /// Export every record matching `q`'s filters as CSV. Pagination is
    /// ignored so the export covers the whole filtered set.
    pub fn export_csv(&self, q: &Query) -> Result<String> {
        let snapshot = self.store.current();
        to_csv(&query::run_all(&snapshot, q))
    }

    /// Register a callback fired once per successful snapshot replace.
    /// Failed polls do not fire it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Arc<Snapshot>) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Lifecycle and outcome events from the poller.
    pub fn events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Poll once now, subject to the same single-flight guard as the timer.
    pub async fn refresh_now(&self) -> TickOutcome {
        self.poller.tick().await
    }

    /// Start the periodic poll loop.
    pub fn start(&self) -> PollerHandle {
        Arc::clone(&self.poller).start()
    }

    /// Stop publishing without a loop handle (e.g. on host teardown).
    pub fn cancel(&self) {
        self.poller.cancel();
    }

    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    pub fn stats(&self) -> PollStats {
        self.poller.stats()
    }
}
