//! Tap configuration
//!
//! The configuration is a flat JSON document supplied by the caller:
//!
//! ```json
//! {
//!   "token": "...",
//!   "email": "ops@example.com",
//!   "since": "2020-01-01T00:00:00Z",
//!   "limit": 100,
//!   "streams": {"incidents": {"statuses[]": ["resolved"]}}
//! }
//! ```

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig, RetryPolicy, DEFAULT_BASE_URL};
use crate::pagination::DEFAULT_LIMIT;
use crate::types::{parse_timestamp, JsonObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// API token
    #[serde(default)]
    pub token: String,

    /// Email of the acting user, sent as the `From` header
    #[serde(default)]
    pub email: String,

    /// Earliest timestamp to extract from
    #[serde(default)]
    pub since: String,

    /// Latest timestamp to extract up to (defaults to now)
    #[serde(default)]
    pub until: Option<String>,

    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Time zone the API renders timestamps in
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Per-stream query parameter overrides
    #[serde(default)]
    pub streams: BTreeMap<String, JsonObject>,

    /// API root, for proxies and tests
    #[serde(default)]
    pub base_url: Option<String>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Client-side request rate
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Total time budget for retrying one request
    #[serde(default)]
    pub max_retry_seconds: Option<u64>,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("token", &self.token),
            ("email", &self.email),
            ("since", &self.since),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        self.since_timestamp()?;
        self.until_timestamp()?;

        if self.limit == 0 {
            return Err(Error::invalid_value("limit", "must be greater than 0"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than 0",
            ));
        }
        if self.time_zone.trim().is_empty() {
            return Err(Error::invalid_value("time_zone", "must not be empty"));
        }

        Ok(())
    }

    /// Configured start of extraction
    pub fn since_timestamp(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.since)
            .ok_or_else(|| Error::invalid_value("since", format!("not a timestamp: {}", self.since)))
    }

    /// Configured end of extraction, if any
    pub fn until_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        self.until
            .as_deref()
            .map(|raw| {
                parse_timestamp(raw)
                    .ok_or_else(|| Error::invalid_value("until", format!("not a timestamp: {raw}")))
            })
            .transpose()
    }

    /// Parameter overrides for one stream
    pub fn stream_overrides(&self, stream_id: &str) -> Option<&JsonObject> {
        self.streams.get(stream_id)
    }

    /// HTTP client settings derived from this config
    pub fn http_config(&self) -> HttpClientConfig {
        let mut retry = RetryPolicy::default();
        if let Some(secs) = self.max_retry_seconds {
            retry = retry.with_max_elapsed(Duration::from_secs(secs));
        }

        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
            .retry(retry)
            .token(&self.token)
            .actor_email(&self.email);

        if let Some(rps) = self.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }
        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_case::test_case;

    const MINIMAL: &str =
        r#"{"token": "abc", "email": "ops@example.com", "since": "2020-01-01T00:00:00Z"}"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = TapConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.limit, 100);
        assert_eq!(config.time_zone, "UTC");
        assert!(config.until.is_none());
        assert!(config.streams.is_empty());
        assert!(config.stream_overrides("incidents").is_none());
    }

    #[test_case(r#"{"email": "a@b.c", "since": "2020-01-01T00:00:00Z"}"#, "token")]
    #[test_case(r#"{"token": "t", "since": "2020-01-01T00:00:00Z"}"#, "email")]
    #[test_case(r#"{"token": "t", "email": "a@b.c"}"#, "since")]
    fn test_missing_required_field(json: &str, expected: &str) {
        match TapConfig::from_json(json).unwrap_err() {
            Error::MissingConfigField { field } => assert_eq!(field, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_values() {
        let bad_since = r#"{"token": "t", "email": "e", "since": "yesterday"}"#;
        assert!(matches!(
            TapConfig::from_json(bad_since).unwrap_err(),
            Error::InvalidConfigValue { .. }
        ));

        let zero_limit =
            r#"{"token": "t", "email": "e", "since": "2020-01-01T00:00:00Z", "limit": 0}"#;
        assert!(TapConfig::from_json(zero_limit).unwrap_err().is_config());

        let bad_until =
            r#"{"token": "t", "email": "e", "since": "2020-01-01T00:00:00Z", "until": "later"}"#;
        assert!(TapConfig::from_json(bad_until).unwrap_err().is_config());
    }

    #[test]
    fn test_unparseable_json_is_config_error() {
        assert!(TapConfig::from_json("{").unwrap_err().is_config());
    }

    #[test]
    fn test_stream_overrides() {
        let json = r#"{
            "token": "t", "email": "e", "since": "2020-01-01",
            "streams": {"incidents": {"statuses[]": ["resolved"], "sort_by": "created_at"}}
        }"#;
        let config = TapConfig::from_json(json).unwrap();
        let overrides = config.stream_overrides("incidents").unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["sort_by"], "created_at");
    }

    #[test]
    fn test_http_config() {
        let json = r#"{
            "token": "secret", "email": "ops@example.com", "since": "2020-01-01T00:00:00Z",
            "base_url": "http://localhost:9999", "user_agent": "custom/1.0",
            "requests_per_second": 4, "max_retry_seconds": 10
        }"#;
        let http = TapConfig::from_json(json).unwrap().http_config();

        assert_eq!(http.base_url, "http://localhost:9999");
        assert_eq!(http.user_agent, "custom/1.0");
        assert_eq!(
            http.default_headers.get("Authorization").map(String::as_str),
            Some("Token token=secret")
        );
        assert_eq!(
            http.default_headers.get("From").map(String::as_str),
            Some("ops@example.com")
        );
        assert_eq!(http.rate_limit.unwrap().requests_per_second, 4);
        assert_eq!(http.retry.max_elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = TapConfig::from_file(&path).unwrap();
        assert_eq!(config.email, "ops@example.com");

        assert!(TapConfig::from_file(dir.path().join("missing.json"))
            .unwrap_err()
            .is_config());
    }
}
