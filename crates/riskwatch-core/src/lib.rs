//! # riskwatch-core
//!
//! Core types and pure logic for riskwatch: classification of scored
//! entities into risk tiers, boundary validation of feed records, the
//! atomically replaced snapshot store, filtering/pagination, and CSV export.
//!
//! Nothing in this crate suspends or performs I/O; polling lives in
//! `riskwatch-poller`.
//!
//! ## Data flow
//!
//! ```text
//! feed -> validator -> classifier -> SnapshotStore -> query / export
//! ```

pub mod classifier;
pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod export;
pub mod logging;
pub mod models;
pub mod query;
pub mod snapshot;
pub mod validator;

// Re-export commonly used types at crate root
pub use classifier::{classify, Thresholds};
pub use config::RiskWatchConfig;
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, RiskEvent};
pub use export::{parse_csv, rows_to_csv, to_csv, CsvRow};
pub use models::{RawRecord, ScoredRecord, Tier, TierCounts};
pub use query::{Query, QueryResult};
pub use snapshot::{Snapshot, SnapshotStore, SnapshotSummary};
pub use validator::{validate, validate_batch, RejectionReason, ValidatedBatch};
