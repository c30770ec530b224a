//! Schema types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// All listed types
    pub fn types(&self) -> &[JsonType] {
        match self {
            JsonTypeOrArray::Single(t) => std::slice::from_ref(t),
            JsonTypeOrArray::Multiple(types) => types,
        }
    }

    /// Check if the type list contains `t`
    pub fn allows(&self, t: JsonType) -> bool {
        self.types().contains(&t)
    }

    /// Check if this type is nullable
    pub fn is_nullable(&self) -> bool {
        self.allows(JsonType::Null)
    }

    /// Non-null types in declaration order
    pub fn non_null(&self) -> impl Iterator<Item = JsonType> + '_ {
        self.types().iter().copied().filter(|t| *t != JsonType::Null)
    }
}

impl std::fmt::Display for JsonTypeOrArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.types().iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// JSON Schema property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Property type(s); untyped properties accept any value
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonTypeOrArray>,

    /// Description (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Format hint (e.g., "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Nested properties (for objects)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Additional properties allowed (for objects)
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Array items schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    /// Check if nullable (untyped properties are)
    pub fn is_nullable(&self) -> bool {
        self.json_type.as_ref().map_or(true, JsonTypeOrArray::is_nullable)
    }

    /// Check if this property carries a `date-time` format
    pub fn is_date_time(&self) -> bool {
        self.format.as_deref() == Some("date-time")
    }
}

/// Full JSON Schema document of one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Schema type (always an object at the top level)
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// Object properties
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,

    /// Allow additional properties
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl JsonSchema {
    /// Get a property
    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }
}

/// Schema of one stream as loaded
///
/// `document` is the schema exactly as written and is what SCHEMA messages
/// and the catalog carry. `typed` is the subset used to coerce records.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSchema {
    pub document: serde_json::Value,
    pub typed: JsonSchema,
}

impl StreamSchema {
    /// Parse a schema document, keeping it verbatim next to its typed view
    pub fn from_value(document: serde_json::Value) -> serde_json::Result<Self> {
        let typed = JsonSchema::deserialize(&document)?;
        Ok(Self { document, typed })
    }
}
