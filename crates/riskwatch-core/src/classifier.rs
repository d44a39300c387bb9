//! Score to tier classification.
//!
//! Cut points are exclusive on the upper side: a score exactly at the medium
//! threshold is `Low`, exactly at the high threshold is `Medium`.

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::Tier;

/// Classifier cut points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Scores strictly above this are at least `Medium`.
    pub medium: f64,
    /// Scores strictly above this are `High`.
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            medium: defaults::THRESHOLD_MEDIUM,
            high: defaults::THRESHOLD_HIGH,
        }
    }
}

impl Thresholds {
    /// Build a validated threshold pair.
    pub fn new(medium: f64, high: f64) -> Result<Self> {
        let thresholds = Self { medium, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Reject cut points that would misclassify silently.
    ///
    /// Both must be finite, inside `[0, 1]`, and `medium < high`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("medium", self.medium), ("high", self.high)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "thresholds.{name} must be a finite number in [0, 1], got {value}"
                )));
            }
        }
        if self.medium >= self.high {
            return Err(Error::Config(format!(
                "thresholds.medium ({}) must be below thresholds.high ({})",
                self.medium, self.high
            )));
        }
        Ok(())
    }

    /// Map a score to its tier. Range checking belongs to the validator.
    pub fn classify(&self, score: f64) -> Tier {
        if score > self.high {
            Tier::High
        } else if score > self.medium {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

/// Classify with the default cut points (0.3 / 0.7).
pub fn classify(score: f64) -> Tier {
    Thresholds::default().classify(score)
}
