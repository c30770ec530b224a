//! Pagination types
//!
//! Request parameters with their offset/limit window, and the page
//! payloads a cursor yields.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::BTreeMap;

/// Default page size when the config does not set one
pub const DEFAULT_LIMIT: u32 = 100;

/// Query parameters for one traversal of a remote collection
///
/// `limit` and `offset` are always present; every other parameter is a JSON
/// value rendered into the query string by [`RequestParameters::to_query`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    limit: u32,
    offset: u32,
    values: BTreeMap<String, JsonValue>,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl RequestParameters {
    /// Create parameters for a traversal starting at offset 0
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            offset: 0,
            values: BTreeMap::new(),
        }
    }

    /// Page size
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Offset of the next request
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Rewind to the first page
    pub fn reset_offset(&mut self) {
        self.offset = 0;
    }

    /// Move the window forward by exactly one page
    pub fn advance(&mut self) {
        self.offset = self.offset.saturating_add(self.limit);
    }

    /// Set a parameter
    ///
    /// `limit` and `offset` must be non-negative integers (numbers or
    /// numeric strings).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "limit" => self.limit = parse_count(&key, &value)?.max(1),
            "offset" => self.offset = parse_count(&key, &value)?,
            _ => {
                self.values.insert(key, value);
            }
        }
        Ok(())
    }

    /// Builder-style variant of [`RequestParameters::insert`] for plain values
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), JsonValue::String(value.into()));
        self
    }

    /// Check whether a parameter is set
    pub fn contains(&self, key: &str) -> bool {
        matches!(key, "limit" | "offset") || self.values.contains_key(key)
    }

    /// Get a non-window parameter
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Get a string parameter
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(JsonValue::as_str)
    }

    /// Render as query pairs; arrays become repeated keys
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];

        for (key, value) in &self.values {
            match value {
                JsonValue::Null => {}
                JsonValue::Array(items) => {
                    for item in items {
                        if let Some(rendered) = render_scalar(item) {
                            pairs.push((key.clone(), rendered));
                        }
                    }
                }
                other => {
                    if let Some(rendered) = render_scalar(other) {
                        pairs.push((key.clone(), rendered));
                    }
                }
            }
        }

        pairs
    }
}

fn parse_count(key: &str, value: &JsonValue) -> Result<u32> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::invalid_value(key, format!("expected a non-negative integer, got {value}")))
}

fn render_scalar(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// One fetched response page
#[derive(Debug, Clone)]
pub struct Page {
    /// Response body
    pub body: JsonObject,
    /// Offset the page was requested with
    pub offset: u32,
    /// Limit the page was requested with
    pub limit: u32,
    /// 1-based page number within its traversal
    pub number: usize,
}

impl Page {
    /// Whether the server reported another page
    ///
    /// Anything other than a literal `true` (absent, null, non-boolean)
    /// ends the traversal.
    pub fn more(&self) -> bool {
        matches!(self.body.get("more"), Some(JsonValue::Bool(true)))
    }

    /// Records listed under `key`; empty when the key is missing
    pub fn records(&self, key: &str) -> &[JsonValue] {
        self.body
            .get(key)
            .and_then(JsonValue::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Take the records listed under `key`
    pub fn into_records(mut self, key: &str) -> Vec<JsonValue> {
        match self.body.remove(key) {
            Some(JsonValue::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}
