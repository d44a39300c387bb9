//! Poller event types, envelope and event bus.
//!
//! The poller emits one [`RiskEvent`] per lifecycle step or poll outcome.
//! Events are wrapped in an [`EventEnvelope`] and broadcast; downstream
//! consumers (SSE bridges, telemetry) subscribe independently. This stream is
//! observational. Consumers that must react to new data use the service's
//! `subscribe` callback, which fires exactly once per published snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::TierCounts;

/// Domain payload of a poller event.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"SnapshotPublished","generation":3,...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RiskEvent {
    /// The background loop started.
    PollerStarted { poll_interval_secs: u64 },
    /// A tick arrived while a fetch was in flight and was dropped.
    PollSkipped,
    /// A poll succeeded and a new snapshot replaced the old one.
    SnapshotPublished {
        generation: u64,
        records: usize,
        rejected: usize,
        counts: TierCounts,
    },
    /// A poll failed; the snapshot at `stale_generation` is now stale.
    PollFailed {
        error: String,
        stale_generation: u64,
    },
    /// The background loop stopped.
    PollerStopped,
}

impl RiskEvent {
    /// Namespaced event type for the envelope (e.g., `"snapshot.published"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            RiskEvent::PollerStarted { .. } => "poller.started",
            RiskEvent::PollSkipped => "poll.skipped",
            RiskEvent::SnapshotPublished { .. } => "snapshot.published",
            RiskEvent::PollFailed { .. } => "poll.failed",
            RiskEvent::PollerStopped => "poller.stopped",
        }
    }
}

/// Versioned wrapper around a [`RiskEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type (e.g., `"poll.failed"`).
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    /// Payload schema version.
    pub payload_version: u32,
    pub payload: RiskEvent,
}

impl EventEnvelope {
    pub fn new(event: RiskEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.event_type().to_string(),
            occurred_at: Utc::now(),
            payload_version: 1,
            payload: event,
        }
    }
}

/// Broadcast-based event bus.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently with none.
    pub fn emit(&self, event: RiskEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
