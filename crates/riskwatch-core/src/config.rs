//! Service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::Thresholds;
use crate::defaults;
use crate::error::{Error, Result};

/// Configuration for the poller and classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWatchConfig {
    /// Seconds between poll ticks.
    pub poll_interval_secs: u64,
    /// Per-fetch timeout in seconds.
    pub feed_timeout_secs: u64,
    /// Classifier cut points.
    pub thresholds: Thresholds,
    /// Broadcast capacity of the event bus.
    pub event_capacity: usize,
    /// Whether the background poll loop runs at all.
    pub enabled: bool,
}

impl Default for RiskWatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            feed_timeout_secs: defaults::FEED_TIMEOUT_SECS,
            thresholds: Thresholds::default(),
            event_capacity: defaults::EVENT_BUS_CAPACITY,
            enabled: true,
        }
    }
}

impl RiskWatchConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `RISKWATCH_POLL_INTERVAL_SECS` | `30` | Poll tick frequency |
    /// | `RISKWATCH_FEED_TIMEOUT_SECS` | `10` | Per-fetch timeout |
    /// | `RISKWATCH_THRESHOLD_MEDIUM` | `0.3` | Low/Medium cut point |
    /// | `RISKWATCH_THRESHOLD_HIGH` | `0.7` | Medium/High cut point |
    /// | `RISKWATCH_POLLER_ENABLED` | `true` | Enable/disable the poll loop |
    ///
    /// Unparseable values fall back to the default. Call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse::<T>().ok())
        }

        let enabled = lookup("RISKWATCH_POLLER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            poll_interval_secs: parsed(lookup("RISKWATCH_POLL_INTERVAL_SECS"))
                .unwrap_or(defaults::POLL_INTERVAL_SECS),
            feed_timeout_secs: parsed(lookup("RISKWATCH_FEED_TIMEOUT_SECS"))
                .unwrap_or(defaults::FEED_TIMEOUT_SECS),
            thresholds: Thresholds {
                medium: parsed(lookup("RISKWATCH_THRESHOLD_MEDIUM"))
                    .unwrap_or(defaults::THRESHOLD_MEDIUM),
                high: parsed(lookup("RISKWATCH_THRESHOLD_HIGH"))
                    .unwrap_or(defaults::THRESHOLD_HIGH),
            },
            event_capacity: defaults::EVENT_BUS_CAPACITY,
            enabled,
        }
    }

    /// Set the poll interval in seconds.
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the per-fetch timeout in seconds.
    pub fn with_feed_timeout(mut self, secs: u64) -> Self {
        self.feed_timeout_secs = secs;
        self
    }

    /// Set classifier cut points.
    pub fn with_thresholds(mut self, medium: f64, high: f64) -> Self {
        self.thresholds = Thresholds { medium, high };
        self
    }

    /// Set event bus capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Enable or disable the poll loop.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.feed_timeout_secs == 0 {
            return Err(Error::Config(
                "feed_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = RiskWatchConfig::default();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.feed_timeout_secs, 10);
        assert_eq!(config.thresholds, Thresholds::default());
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = RiskWatchConfig::default()
            .with_poll_interval(5)
            .with_feed_timeout(2)
            .with_thresholds(0.4, 0.8)
            .with_event_capacity(8)
            .with_enabled(false);

        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.feed_timeout(), Duration::from_secs(2));
        assert_eq!(config.thresholds.medium, 0.4);
        assert_eq!(config.thresholds.high, 0.8);
        assert_eq!(config.event_capacity, 8);
        assert!(!config.enabled);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = RiskWatchConfig::from_lookup(lookup(&[
            ("RISKWATCH_POLL_INTERVAL_SECS", "15"),
            ("RISKWATCH_FEED_TIMEOUT_SECS", " 3 "),
            ("RISKWATCH_THRESHOLD_MEDIUM", "0.25"),
            ("RISKWATCH_THRESHOLD_HIGH", "0.75"),
            ("RISKWATCH_POLLER_ENABLED", "0"),
        ]));

        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.feed_timeout_secs, 3);
        assert_eq!(config.thresholds.medium, 0.25);
        assert_eq!(config.thresholds.high, 0.75);
        assert!(!config.enabled);
    }

    #[test]
    fn test_config_from_lookup_falls_back_on_garbage() {
        let config = RiskWatchConfig::from_lookup(lookup(&[
            ("RISKWATCH_POLL_INTERVAL_SECS", "soon"),
            ("RISKWATCH_THRESHOLD_HIGH", "very"),
        ]));
        assert_eq!(config, RiskWatchConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let config = RiskWatchConfig::default().with_thresholds(0.7, 0.3);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        assert!(RiskWatchConfig::default().with_poll_interval(0).validate().is_err());
        assert!(RiskWatchConfig::default().with_feed_timeout(0).validate().is_err());
        assert!(RiskWatchConfig::default().with_event_capacity(0).validate().is_err());
    }

    #[test]
    fn test_config_json_partial() {
        let config: RiskWatchConfig =
            serde_json::from_str(r#"{"poll_interval_secs":60,"thresholds":{"medium":0.2}}"#)
                .unwrap();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.feed_timeout_secs, 10);
        assert_eq!(config.thresholds.medium, 0.2);
        assert_eq!(config.thresholds.high, 0.7);
    }
}
