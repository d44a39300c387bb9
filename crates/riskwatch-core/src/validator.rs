//! Boundary validation of raw feed records.
//!
//! A bad record is excluded and counted; it never fails the batch.

use thiserror::Error;
use tracing::trace;

use crate::classifier::Thresholds;
use crate::logging::SUBSYSTEM_VALIDATOR;
use crate::models::{RawRecord, ScoredRecord};

/// Why a raw record was kept out of the snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectionReason {
    #[error("identifier is empty")]
    EmptyIdentifier,

    #[error("score is not a finite number")]
    ScoreNotFinite,

    #[error("score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),

    #[error("timestamp {0} is negative")]
    NegativeTimestamp(i64),
}

/// Validate and classify a single raw record.
pub fn validate(raw: RawRecord, thresholds: &Thresholds) -> Result<ScoredRecord, RejectionReason> {
    if raw.identifier.is_empty() {
        return Err(RejectionReason::EmptyIdentifier);
    }
    if !raw.score.is_finite() {
        return Err(RejectionReason::ScoreNotFinite);
    }
    if !(0.0..=1.0).contains(&raw.score) {
        return Err(RejectionReason::ScoreOutOfRange(raw.score));
    }
    if raw.timestamp < 0 {
        return Err(RejectionReason::NegativeTimestamp(raw.timestamp));
    }

    let tier = thresholds.classify(raw.score);
    Ok(ScoredRecord::new(raw, tier))
}

/// Outcome of validating one feed payload.
#[derive(Debug, Default)]
pub struct ValidatedBatch {
    /// Accepted records, in feed order.
    pub records: Vec<ScoredRecord>,
    /// Feed position and reason for every rejected record.
    pub rejected: Vec<(usize, RejectionReason)>,
}

impl ValidatedBatch {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Validate a whole feed payload, preserving feed order of accepted records.
pub fn validate_batch(raws: Vec<RawRecord>, thresholds: &Thresholds) -> ValidatedBatch {
    let mut batch = ValidatedBatch {
        records: Vec::with_capacity(raws.len()),
        rejected: Vec::new(),
    };

    for (position, raw) in raws.into_iter().enumerate() {
        match validate(raw, thresholds) {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                trace!(
                    subsystem = SUBSYSTEM_VALIDATOR,
                    position,
                    %reason,
                    "Rejected feed record"
                );
                batch.rejected.push((position, reason));
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tier;

    fn thresholds() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_validate_accepts_well_formed_record() {
        let raw = RawRecord::new("0xabc", 0.42, 1_700_000_000).with_attributes(["mixer"]);
        let record = validate(raw, &thresholds()).unwrap();

        assert_eq!(record.identifier(), "0xabc");
        assert_eq!(record.score(), 0.42);
        assert_eq!(record.tier(), Tier::Medium);
        assert_eq!(record.timestamp(), 1_700_000_000);
        assert_eq!(record.attributes(), ["mixer".to_string()]);
    }

    #[test]
    fn test_validate_rejects_empty_identifier() {
        let err = validate(RawRecord::new("", 0.5, 0), &thresholds()).unwrap_err();
        assert_eq!(err, RejectionReason::EmptyIdentifier);

    }

    #[test]
    fn test_validate_keeps_whitespace_identifier() {
        let record = validate(RawRecord::new(" ", 0.5, 0), &thresholds()).unwrap();
        assert_eq!(record.identifier(), " ");
        assert_eq!(record.tier(), Tier::Medium);
    }

    #[test]
    fn test_validate_rejects_non_finite_score() {
        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = validate(RawRecord::new("id", score, 0), &thresholds()).unwrap_err();
            assert_eq!(err, RejectionReason::ScoreNotFinite);
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let err = validate(RawRecord::new("id", 1.01, 0), &thresholds()).unwrap_err();
        assert_eq!(err, RejectionReason::ScoreOutOfRange(1.01));

        let err = validate(RawRecord::new("id", -0.01, 0), &thresholds()).unwrap_err();
        assert_eq!(err, RejectionReason::ScoreOutOfRange(-0.01));
    }

    #[test]
    fn test_validate_accepts_range_endpoints() {
        assert_eq!(validate(RawRecord::new("a", 0.0, 0), &thresholds()).unwrap().tier(), Tier::Low);
        assert_eq!(validate(RawRecord::new("b", 1.0, 0), &thresholds()).unwrap().tier(), Tier::High);
    }

    #[test]
    fn test_validate_rejects_negative_timestamp() {
        let err = validate(RawRecord::new("id", 0.5, -1), &thresholds()).unwrap_err();
        assert_eq!(err, RejectionReason::NegativeTimestamp(-1));
    }

    #[test]
    fn test_validate_batch_keeps_good_records_in_order() {
        let raws = vec![
            RawRecord::new("first", 0.1, 10),
            RawRecord::new("", 0.5, 10),
            RawRecord::new("second", 0.9, 10),
            RawRecord::new("bad-score", 7.0, 10),
            RawRecord::new("third", 0.5, 10),
        ];

        let batch = validate_batch(raws, &thresholds());

        let ids: Vec<_> = batch.records.iter().map(|r| r.identifier()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(batch.rejected_count(), 2);
        assert_eq!(batch.rejected[0], (1, RejectionReason::EmptyIdentifier));
        assert_eq!(batch.rejected[1], (3, RejectionReason::ScoreOutOfRange(7.0)));
    }

    #[test]
    fn test_validate_batch_all_rejected_is_empty_not_error() {
        let raws = vec![RawRecord::new("", f64::NAN, -5)];
        let batch = validate_batch(raws, &thresholds());
        assert!(batch.records.is_empty());
        assert_eq!(batch.rejected_count(), 1);
    }

    #[test]
    fn test_rejection_reason_display() {
        assert_eq!(
            RejectionReason::ScoreOutOfRange(1.5).to_string(),
            "score 1.5 is outside [0, 1]"
        );
        assert_eq!(
            RejectionReason::NegativeTimestamp(-3).to_string(),
            "timestamp -3 is negative"
        );
    }
}
