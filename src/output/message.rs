//! Message types
//!
//! The wire shape follows the Singer convention:
//!
//! ```json
//! {"type": "SCHEMA", "stream": "incidents", "schema": {...}, "key_properties": ["id"]}
//! {"type": "RECORD", "stream": "incidents", "record": {...}, "time_extracted": "..."}
//! {"type": "STATE", "value": {"bookmarks": {...}}}
//! ```

use crate::error::Result;
use crate::types::JsonValue;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A message emitted during discovery-driven sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Schema declaration, emitted once per stream before its records
    Schema {
        /// Stream id
        stream: String,
        /// JSON schema of the records
        schema: JsonValue,
        /// Primary-key fields
        key_properties: Vec<String>,
        /// Replication key of incremental streams
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One data record
    Record {
        /// Stream id
        stream: String,
        /// The record
        record: JsonValue,
        /// When the record was fetched
        time_extracted: String,
    },
    /// Whole-state checkpoint
    State {
        /// The state
        value: JsonValue,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: &[&str],
        bookmark_properties: &[&str],
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties: key_properties.iter().map(ToString::to_string).collect(),
            bookmark_properties: bookmark_properties.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue, extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: extracted.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Stream this message belongs to (state messages belong to none)
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Serialize as a single line of JSON (no trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
