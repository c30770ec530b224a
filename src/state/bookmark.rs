//! Incremental bookmark tracking
//!
//! A bookmark is a high-water mark over a stream's replication key. It only
//! moves forward, and only to values of records that were actually emitted.

use super::types::State;
use crate::error::{Error, Result};
use crate::types::{format_timestamp, parse_timestamp, JsonValue};
use chrono::{DateTime, Utc};

/// Fold one candidate value into a high-water mark
pub fn advance(current: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> DateTime<Utc> {
    match current {
        Some(current) => current.max(candidate),
        None => candidate,
    }
}

/// Whether a record belongs to this incremental run
///
/// The boundary is inclusive: a record stamped exactly at the committed
/// bookmark is emitted again, and consumers dedupe by primary key.
pub fn in_scope(value: DateTime<Utc>, committed: Option<DateTime<Utc>>) -> bool {
    committed.map_or(true, |committed| value >= committed)
}

/// Tracks one stream's bookmark across a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkTracker {
    key: String,
    committed: Option<DateTime<Utc>>,
    high_water: Option<DateTime<Utc>>,
}

impl BookmarkTracker {
    /// Start from an already-committed bookmark (or none)
    pub fn new(key: impl Into<String>, committed: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            committed,
            high_water: committed,
        }
    }

    /// Snapshot the committed bookmark of `stream` from state
    pub fn from_state(state: &State, stream: &str, key: &str) -> Result<Self> {
        let committed = match state.get_bookmark(stream, key) {
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                Error::state(format!(
                    "bookmark '{key}' of stream '{stream}' is not a timestamp: {raw}"
                ))
            })?),
            None => None,
        };
        Ok(Self::new(key, committed))
    }

    /// Replication-key field name
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bookmark committed before this run started
    pub fn committed(&self) -> Option<DateTime<Utc>> {
        self.committed
    }

    /// Highest value seen so far (including the committed bookmark)
    pub fn high_water_mark(&self) -> Option<DateTime<Utc>> {
        self.high_water
    }

    /// Replication-key value of a record, if present and parseable
    pub fn value_of(&self, record: &JsonValue) -> Option<DateTime<Utc>> {
        record.get(&self.key)?.as_str().and_then(parse_timestamp)
    }

    /// In-scope check against the start-of-run snapshot
    pub fn in_scope(&self, value: DateTime<Utc>) -> bool {
        in_scope(value, self.committed)
    }

    /// Record that a record with this value was emitted
    pub fn observe(&mut self, value: DateTime<Utc>) {
        self.high_water = Some(advance(self.high_water, value));
    }

    /// Write the high-water mark into state; returns the bookmark now held
    ///
    /// When nothing newer than the committed bookmark was seen, the stored
    /// text is left exactly as it was.
    pub fn commit(&self, state: &mut State, stream: &str) -> Option<String> {
        let high_water = self.high_water?;
        if self.committed == Some(high_water) {
            return state.get_bookmark(stream, &self.key).map(ToString::to_string);
        }
        let value = format_timestamp(high_water);
        state.write_bookmark(stream, &self.key, value.clone());
        Some(value)
    }
}
