//! Common types used throughout the tap
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication Method
// ============================================================================

/// How a stream is replicated between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Fetch everything every run, never bookmark
    #[default]
    FullTable,
    /// Resume from the last committed replication-key value
    Incremental,
}

impl ReplicationMethod {
    /// Wire name used in catalog metadata
    pub fn as_str(self) -> &'static str {
        match self {
            ReplicationMethod::FullTable => "FULL_TABLE",
            ReplicationMethod::Incremental => "INCREMENTAL",
        }
    }
}

impl std::fmt::Display for ReplicationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Wire format for timestamps sent to and bookmarked from the API
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a timestamp the way the API and state file expect it
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp into UTC
///
/// Accepts RFC 3339 (any offset) plus a few offset-less forms, which are
/// taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_replication_method_serde() {
        let method: ReplicationMethod = serde_json::from_str("\"INCREMENTAL\"").unwrap();
        assert_eq!(method, ReplicationMethod::Incremental);

        let json = serde_json::to_string(&ReplicationMethod::FullTable).unwrap();
        assert_eq!(json, "\"FULL_TABLE\"");
        assert_eq!(ReplicationMethod::FullTable.to_string(), "FULL_TABLE");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2020-01-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2020-01-01T13:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-01-01T12:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2020-01-01"),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_timestamp(dt), "2021-03-04T05:06:07Z");
    }
}
