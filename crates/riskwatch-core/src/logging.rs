//! Structured logging conventions for riskwatch.
//!
//! Every span and event carries a `subsystem` field whose value is one of the
//! constants below, so log aggregation can slice output by component.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (feed failure, snapshot marked stale) |
//! | INFO  | Lifecycle events (poller start/stop), snapshot publication |
//! | DEBUG | Decision points (skipped tick, query counts) |
//! | TRACE | Per-record iteration (rejections) |
//!
//! Common field names: `generation`, `record_count`, `rejected_count`,
//! `duration_ms`, `result_count`, `error`, `stale`.

/// Poller loop and tick execution.
pub const SUBSYSTEM_POLLER: &str = "poller";

/// Snapshot store writes.
pub const SUBSYSTEM_STORE: &str = "store";

/// Record validation at the feed boundary.
pub const SUBSYSTEM_VALIDATOR: &str = "validator";

/// Query engine.
pub const SUBSYSTEM_QUERY: &str = "query";

/// CSV export.
pub const SUBSYSTEM_EXPORT: &str = "export";

/// Upstream feed clients.
pub const SUBSYSTEM_FEED: &str = "feed";
