//! Error types for riskwatch.

use thiserror::Error;

/// Result type alias using riskwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for riskwatch operations.
///
/// Per-record validation failures are not represented here; they are
/// [`RejectionReason`](crate::validator::RejectionReason) values that the
/// poller counts and drops.
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream feed fetch failed
    #[error("Feed error: {0}")]
    Feed(String),

    /// Upstream feed did not answer within the configured timeout
    #[error("Feed timed out after {0}s")]
    FeedTimeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// CSV export or parse failed
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Export(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Feed(format!("request timed out: {e}"))
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_feed() {
        let err = Error::Feed("connection refused".to_string());
        assert_eq!(err.to_string(), "Feed error: connection refused");
    }

    #[test]
    fn test_error_display_feed_timeout() {
        let err = Error::FeedTimeout(10);
        assert_eq!(err.to_string(), "Feed timed out after 10s");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("thresholds inverted".to_string());
        assert_eq!(err.to_string(), "Configuration error: thresholds inverted");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("page_size must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: page_size must be positive");
    }

    #[test]
    fn test_error_display_export() {
        let err = Error::Export("bad header".to_string());
        assert_eq!(err.to_string(), "Export error: bad header");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_csv_error() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("a,b\nc".as_bytes());
        let err = reader
            .records()
            .find_map(|r| r.err())
            .expect("ragged input should fail");

        let err: Error = err.into();
        assert!(err.to_string().starts_with("Export error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Feed("down".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Feed"));
    }
}
