//! Centralized default constants for riskwatch.
//!
//! **This module is the single source of truth** for shared default values.
//! Classifier cut points in particular must never be repeated as literals
//! elsewhere.

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Scores strictly above this are at least Medium.
pub const THRESHOLD_MEDIUM: f64 = 0.3;

/// Scores strictly above this are High.
pub const THRESHOLD_HIGH: f64 = 0.7;

// =============================================================================
// POLLING
// =============================================================================

/// Seconds between poll ticks.
pub const POLL_INTERVAL_SECS: u64 = 30;

/// Per-fetch timeout in seconds.
pub const FEED_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 64;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for queries.
pub const PAGE_SIZE: usize = 25;

/// Default page index.
pub const PAGE: usize = 0;
