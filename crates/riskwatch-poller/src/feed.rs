//! Upstream feed clients.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use riskwatch_core::logging::SUBSYSTEM_FEED;
use riskwatch_core::{Error, RawRecord, Result};

/// Source of raw scored records.
///
/// Implementations own transport details. The poller applies its own timeout
/// and cancellation around [`fetch`](FeedClient::fetch), so a slow
/// implementation cannot stall the service.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch the complete current record list.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// REST feed returning a JSON array of records.
///
/// Accepted bodies are either a bare array or an object wrapping the array
/// under `records` or `data`. Each element is decoded leniently; see
/// [`parse_feed_body`].
pub struct HttpFeedClient {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!("{} returned HTTP {status}", self.url)));
        }

        let body = response.text().await?;
        let records = parse_feed_body(&body)?;
        debug!(
            subsystem = SUBSYSTEM_FEED,
            url = %self.url,
            record_count = records.len(),
            "Feed fetched"
        );
        Ok(records)
    }
}

/// Decode a feed response body.
///
/// A body that is not JSON, or not a list, fails the poll. Individual
/// elements never do: a field with the wrong type decodes to a value the
/// validator will reject (empty identifier, `NaN` score, negative timestamp),
/// so one malformed element cannot sink the others.
pub fn parse_feed_body(body: &str) -> Result<Vec<RawRecord>> {
    let value: JsonValue = serde_json::from_str(body)?;
    let items = match value {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut map) => match map.remove("records").or_else(|| map.remove("data")) {
            Some(JsonValue::Array(items)) => items,
            _ => {
                return Err(Error::Feed(
                    "feed object has no `records` or `data` array".to_string(),
                ))
            }
        },
        other => {
            return Err(Error::Feed(format!(
                "feed body must be a JSON array, got {}",
                json_kind(&other)
            )))
        }
    };

    Ok(items.iter().map(lenient_record).collect())
}

fn field<'a>(item: &'a JsonValue, names: &[&str]) -> Option<&'a JsonValue> {
    names
        .iter()
        .find_map(|name| item.get(*name).filter(|value| !value.is_null()))
}

fn lenient_record(item: &JsonValue) -> RawRecord {
    let identifier = match field(item, &["identifier", "id", "address", "hash"]) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let score = field(item, &["score", "risk_score", "riskScore"])
        .and_then(JsonValue::as_f64)
        .unwrap_or(f64::NAN);
    let timestamp = field(item, &["timestamp", "ts"])
        .and_then(JsonValue::as_i64)
        .unwrap_or(-1);
    let attributes = field(item, &["attributes", "flags"])
        .and_then(JsonValue::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    RawRecord {
        identifier,
        score,
        timestamp,
        attributes,
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let body = r#"[
            {"identifier":"0xabc","score":0.42,"timestamp":1700000000,"attributes":["mixer"]},
            {"identifier":"0xdef","score":0.9,"timestamp":1700000060}
        ]"#;
        let records = parse_feed_body(body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            RawRecord::new("0xabc", 0.42, 1_700_000_000).with_attributes(["mixer"])
        );
        assert!(records[1].attributes.is_empty());
    }

    #[test]
    fn test_parse_wrapped_array() {
        let body = r#"{"records":[{"id":"tx1","risk_score":0.1,"ts":5}]}"#;
        let records = parse_feed_body(body).unwrap();
        assert_eq!(records, vec![RawRecord::new("tx1", 0.1, 5)]);

        let body = r#"{"data":[{"address":"0x1","riskScore":1,"timestamp":0}]}"#;
        let records = parse_feed_body(body).unwrap();
        assert_eq!(records, vec![RawRecord::new("0x1", 1.0, 0)]);
    }

    #[test]
    fn test_parse_malformed_elements_decode_to_rejectable_records() {
        let body = r#"[
            {"identifier":"ok","score":0.5,"timestamp":1},
            {"identifier":null,"score":"high","timestamp":"yesterday"},
            42
        ]"#;
        let records = parse_feed_body(body).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], RawRecord::new("ok", 0.5, 1));
        assert!(records[1].identifier.is_empty());
        assert!(records[1].score.is_nan());
        assert_eq!(records[1].timestamp, -1);
        assert!(records[2].identifier.is_empty());
    }

    #[test]
    fn test_parse_null_field_falls_through_to_alias() {
        let body = r#"[{"identifier":null,"id":"0xabc","score":null,"risk_score":0.3,"timestamp":2}]"#;
        let records = parse_feed_body(body).unwrap();
        assert_eq!(records, vec![RawRecord::new("0xabc", 0.3, 2)]);
    }

    #[test]
    fn test_parse_numeric_identifier() {
        let records = parse_feed_body(r#"[{"id":1234,"score":0.2,"timestamp":3}]"#).unwrap();
        assert_eq!(records[0].identifier, "1234");
    }

    #[test]
    fn test_parse_rejects_non_list_bodies() {
        assert!(matches!(parse_feed_body("not json"), Err(Error::Serialization(_))));
        assert!(matches!(parse_feed_body("42"), Err(Error::Feed(_))));
        assert!(matches!(parse_feed_body(r#"{"items":[]}"#), Err(Error::Feed(_))));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_feed_body("[]").unwrap().is_empty());
    }

    #[test]
    fn test_http_feed_client_construction() {
        let client = HttpFeedClient::new("http://127.0.0.1:9/feed", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9/feed");
    }
}
