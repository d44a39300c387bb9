//! Stateless filtering and pagination over a captured snapshot.
//!
//! # Algorithm
//!
//! 1. Keep records whose tier equals `tier_filter` (when set).
//! 2. Keep records whose case-folded identifier contains the case-folded
//!    search term (when non-empty).
//! 3. Preserve snapshot order; no implicit sort.
//! 4. `total_matched` is counted after filtering, before pagination.
//! 5. Slice `[page * page_size, page * page_size + page_size)`, clamped.
//!    An out-of-range page is empty, never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};
use crate::logging::SUBSYSTEM_QUERY;
use crate::models::{ScoredRecord, Tier};
use crate::snapshot::Snapshot;

/// A single filter + page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Substring to look for in identifiers. Empty matches everything.
    pub search_term: String,
    pub tier_filter: Option<Tier>,
    /// Zero-based page index.
    pub page: usize,
    pub page_size: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            tier_filter: None,
            page: defaults::PAGE,
            page_size: defaults::PAGE_SIZE,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier_filter = Some(tier);
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Reject a zero page size. [`run`] tolerates one regardless.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidInput(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn matcher(&self) -> Matcher {
        Matcher {
            tier: self.tier_filter,
            needle: (!self.search_term.is_empty()).then(|| self.search_term.to_lowercase()),
        }
    }
}

/// One page of matches plus the pre-pagination total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub items: Vec<ScoredRecord>,
    pub total_matched: usize,
    pub page: usize,
    pub page_size: usize,
}

impl QueryResult {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_matched.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }
}

struct Matcher {
    tier: Option<Tier>,
    needle: Option<String>,
}

impl Matcher {
    fn matches(&self, record: &ScoredRecord) -> bool {
        if let Some(tier) = self.tier {
            if record.tier() != tier {
                return false;
            }
        }
        match &self.needle {
            Some(needle) => record.identifier().to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

/// Run `query` against `snapshot`. Deterministic and side-effect free.
pub fn run(snapshot: &Snapshot, query: &Query) -> QueryResult {
    let page_size = query.page_size.max(1);
    let matcher = query.matcher();
    let start = query.page.saturating_mul(page_size);

    let mut total_matched = 0;
    let mut items = Vec::new();
    for record in snapshot.records().iter().filter(|r| matcher.matches(r)) {
        if total_matched >= start && items.len() < page_size {
            items.push(record.clone());
        }
        total_matched += 1;
    }

    debug!(
        subsystem = SUBSYSTEM_QUERY,
        generation = snapshot.generation(),
        result_count = total_matched,
        returned = items.len(),
        page = query.page,
        page_size,
        "Query executed"
    );

    QueryResult {
        items,
        total_matched,
        page: query.page,
        page_size,
    }
}

/// Every record matching `query`'s filters, ignoring pagination.
pub fn run_all(snapshot: &Snapshot, query: &Query) -> Vec<ScoredRecord> {
    let matcher = query.matcher();
    snapshot
        .records()
        .iter()
        .filter(|r| matcher.matches(r))
        .cloned()
        .collect()
}
