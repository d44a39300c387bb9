//! Record and tier types shared by every riskwatch component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Risk tier derived from a score. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "Low",
            Tier::Medium => "Medium",
            Tier::High => "High",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Tier::Low),
            "medium" => Ok(Tier::Medium),
            "high" => Ok(Tier::High),
            other => Err(Error::InvalidInput(format!("unknown tier: {other:?}"))),
        }
    }
}

/// A record as delivered by the upstream feed. May be malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Transaction hash, address or other entity key.
    pub identifier: String,
    pub score: f64,
    /// Epoch seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl RawRecord {
    pub fn new(identifier: impl Into<String>, score: f64, timestamp: i64) -> Self {
        Self {
            identifier: identifier.into(),
            score,
            timestamp,
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// A validated, classified record.
///
/// Only the validator constructs these, so `score` is always finite and in
/// `[0, 1]` and `tier` always agrees with the thresholds in force at the time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    identifier: String,
    score: f64,
    tier: Tier,
    timestamp: i64,
    attributes: Vec<String>,
}

impl ScoredRecord {
    pub(crate) fn new(raw: RawRecord, tier: Tier) -> Self {
        Self {
            identifier: raw.identifier,
            score: raw.score,
            tier,
            timestamp: raw.timestamp,
            attributes: raw.attributes,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

/// Per-tier record counts. Every tier is always present, zero-filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl TierCounts {
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.increment(record.tier());
        }
        counts
    }

    pub fn increment(&mut self, tier: Tier) {
        match tier {
            Tier::Low => self.low += 1,
            Tier::Medium => self.medium += 1,
            Tier::High => self.high += 1,
        }
    }

    pub fn get(&self, tier: Tier) -> usize {
        match tier {
            Tier::Low => self.low,
            Tier::Medium => self.medium,
            Tier::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    /// `(tier, count)` pairs in ascending tier order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, usize)> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }
}
