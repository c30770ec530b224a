//! State types for tracking sync progress
//!
//! These types are serialized to JSON and round-trip through the caller
//! between runs.

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookmarks of one stream, keyed by replication-key name
pub type StreamBookmarks = BTreeMap<String, JsonValue>;

/// Complete state handed to and returned from a run
///
/// ```json
/// {"bookmarks": {"incidents": {"last_status_change_at": "2020-01-01T00:00:00Z"}},
///  "currently_syncing": null}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamBookmarks>,

    /// Stream that was mid-sync when this state was written
    #[serde(default)]
    pub currently_syncing: Option<String>,

    /// Keys this tap does not know about; preserved as-is
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bookmark value for a stream
    pub fn get_bookmark(&self, stream: &str, key: &str) -> Option<&str> {
        self.bookmarks.get(stream)?.get(key)?.as_str()
    }

    /// Set a bookmark value for a stream
    pub fn write_bookmark(&mut self, stream: &str, key: &str, value: impl Into<String>) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(key.to_string(), JsonValue::String(value.into()));
    }

    /// Mark a stream as in progress, or clear the marker with `None`
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(ToString::to_string);
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert!(state.currently_syncing.is_none());
    }

    #[test]
    fn test_state_bookmarks() {
        let mut state = State::new();
        assert!(state.get_bookmark("incidents", "last_status_change_at").is_none());

        state.write_bookmark("incidents", "last_status_change_at", "2024-01-01T00:00:00Z");
        assert_eq!(
            state.get_bookmark("incidents", "last_status_change_at"),
            Some("2024-01-01T00:00:00Z")
        );
        assert!(state.get_bookmark("incidents", "created_at").is_none());
    }

    #[test]
    fn test_currently_syncing() {
        let mut state = State::new();
        state.set_currently_syncing(Some("notifications"));
        assert_eq!(state.currently_syncing.as_deref(), Some("notifications"));
        state.set_currently_syncing(None);
        assert!(state.currently_syncing.is_none());
    }

    #[test]
    fn test_state_round_trips_unknown_keys() {
        let raw = json!({
            "bookmarks": {"notifications": {"started_at": "2020-02-02T00:00:00Z"}},
            "currently_syncing": "notifications",
            "version": 3
        });

        let state: State = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            state.get_bookmark("notifications", "started_at"),
            Some("2020-02-02T00:00:00Z")
        );
        assert_eq!(state.extra.get("version"), Some(&json!(3)));
        assert_eq!(state.to_value(), raw);
    }

    #[test]
    fn test_state_from_empty_object() {
        let state: State = serde_json::from_str("{}").unwrap();
        assert_eq!(state, State::new());
    }
}
