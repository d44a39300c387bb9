//! # riskwatch-poller
//!
//! Periodic feed polling and the service facade for riskwatch.
//!
//! This crate provides:
//! - The [`FeedClient`] seam and a REST implementation
//! - A single-flight [`Poller`] with timeout, cancellation and staleness
//! - Snapshot-change callbacks and a broadcast event stream
//! - [`RiskWatch`], the facade hosts embed
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use riskwatch_poller::{HttpFeedClient, Query, RiskWatch, RiskWatchConfig, Tier};
//!
//! let config = RiskWatchConfig::from_env();
//! let feed = HttpFeedClient::new("https://risk.example/api/alerts", config.feed_timeout())?;
//! let watch = RiskWatch::builder(Arc::new(feed)).with_config(config).build()?;
//!
//! watch.subscribe(|snapshot| println!("{} records", snapshot.len()));
//! let handle = watch.start();
//!
//! let high = watch.query(&Query::new().with_tier(Tier::High));
//! let csv = watch.export_csv(&Query::new().with_search("0x"))?;
//!
//! handle.shutdown().await?;
//! ```

pub mod feed;
pub mod poller;
pub mod service;
pub mod subscribers;

// Re-export core types
pub use riskwatch_core::*;

pub use feed::{parse_feed_body, FeedClient, HttpFeedClient};
pub use poller::{PollStats, Poller, PollerHandle, PollerState, TickOutcome};
pub use service::{RiskWatch, RiskWatchBuilder};
pub use subscribers::{SnapshotCallback, Subscribers, SubscriptionId};
