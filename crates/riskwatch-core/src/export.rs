//! CSV export of query results.
//!
//! Columns are fixed: `identifier,score,tier,timestamp`. The header is always
//! written, records are separated by `\n`, and the output does not end with a
//! line terminator. Fields containing a comma, double quote or line break are
//! quoted with inner quotes doubled.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::logging::SUBSYSTEM_EXPORT;
use crate::models::ScoredRecord;

/// Column names, in output order.
pub const HEADER: [&str; 4] = ["identifier", "score", "tier", "timestamp"];

/// One exported row as text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub identifier: String,
    pub score: String,
    pub tier: String,
    pub timestamp: String,
}

impl From<&ScoredRecord> for CsvRow {
    fn from(record: &ScoredRecord) -> Self {
        Self {
            identifier: record.identifier().to_string(),
            score: record.score().to_string(),
            tier: record.tier().to_string(),
            timestamp: record.timestamp().to_string(),
        }
    }
}

/// Serialize records to CSV.
pub fn to_csv(items: &[ScoredRecord]) -> Result<String> {
    rows_to_csv(items.iter().map(CsvRow::from))
}

/// Serialize already-stringified rows to CSV.
pub fn rows_to_csv<I>(rows: I) -> Result<String>
where
    I: IntoIterator<Item = CsvRow>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    let mut written = 0usize;
    for row in rows {
        writer.write_record([
            row.identifier.as_str(),
            row.score.as_str(),
            row.tier.as_str(),
            row.timestamp.as_str(),
        ])?;
        written += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Export(format!("failed to flush CSV writer: {e}")))?;
    let mut out = String::from_utf8(bytes)
        .map_err(|e| Error::Export(format!("CSV output is not UTF-8: {e}")))?;
    if out.ends_with('\n') {
        out.pop();
    }

    debug!(subsystem = SUBSYSTEM_EXPORT, rows = written, bytes = out.len(), "CSV exported");
    Ok(out)
}

/// Parse CSV produced by [`to_csv`] back into rows.
///
/// The header must match [`HEADER`] exactly.
pub fn parse_csv(text: &str) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?;
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(Error::Export(format!(
            "unexpected CSV header: {:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        rows.push(CsvRow {
            identifier: field(0),
            score: field(1),
            tier: field(2),
            timestamp: field(3),
        });
    }
    Ok(rows)
}
