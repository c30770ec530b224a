//! Schema-driven record coercion
//!
//! Records are reshaped to their stream's schema before emission: values
//! are converted to the declared type where the conversion is lossless,
//! `date-time` strings are normalized to RFC 3339 UTC, and properties the
//! schema does not declare are dropped.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::{parse_timestamp, JsonObject, JsonValue};
use chrono::SecondsFormat;
use std::collections::BTreeMap;

/// Coerce one record to `schema`
pub fn coerce_record(stream: &str, schema: &JsonSchema, record: JsonValue) -> Result<JsonValue> {
    match record {
        JsonValue::Object(object) => {
            coerce_object(stream, "$", &schema.properties, object).map(JsonValue::Object)
        }
        other => Err(Error::schema_mismatch(
            stream,
            "$",
            format!("expected an object record, got {}", kind(&other)),
        )),
    }
}

fn coerce_object(
    stream: &str,
    path: &str,
    properties: &BTreeMap<String, SchemaProperty>,
    mut object: JsonObject,
) -> Result<JsonObject> {
    let mut out = JsonObject::new();
    // keep the record's own field order
    let keys: Vec<String> = object.keys().cloned().collect();
    for key in keys {
        let Some(property) = properties.get(&key) else {
            continue;
        };
        let Some(value) = object.remove(&key) else {
            continue;
        };
        let child = format!("{path}.{key}");
        out.insert(key, coerce_value(stream, &child, property, value)?);
    }
    Ok(out)
}

fn coerce_value(
    stream: &str,
    path: &str,
    property: &SchemaProperty,
    value: JsonValue,
) -> Result<JsonValue> {
    let Some(ref types) = property.json_type else {
        return Ok(value);
    };

    if value.is_null() {
        return if types.is_nullable() {
            Ok(JsonValue::Null)
        } else {
            Err(Error::schema_mismatch(stream, path, format!("null is not allowed for type {types}")))
        };
    }

    // Exact matches win over conversions, so ["integer", "string"] keeps "5" a string
    if let Some(exact) = types.non_null().find(|t| matches_exactly(*t, &value)) {
        return convert(stream, path, exact, property, value);
    }

    for target in types.non_null() {
        if let Some(converted) = loose_convert(target, &value) {
            return convert(stream, path, target, property, converted);
        }
    }

    Err(Error::schema_mismatch(
        stream,
        path,
        format!("expected {types}, got {}", kind(&value)),
    ))
}

/// Finish a value already known to be of type `target`
fn convert(
    stream: &str,
    path: &str,
    target: JsonType,
    property: &SchemaProperty,
    value: JsonValue,
) -> Result<JsonValue> {
    match (target, value) {
        (JsonType::String, JsonValue::String(s)) if property.is_date_time() => {
            let parsed = parse_timestamp(&s).ok_or_else(|| {
                Error::schema_mismatch(stream, path, format!("'{s}' is not a date-time"))
            })?;
            Ok(JsonValue::String(
                parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ))
        }
        (JsonType::Object, JsonValue::Object(object)) => match property.properties {
            Some(ref nested) => coerce_object(stream, path, nested, object).map(JsonValue::Object),
            None => Ok(JsonValue::Object(object)),
        },
        (JsonType::Array, JsonValue::Array(items)) => match property.items {
            Some(ref item_schema) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| coerce_value(stream, &format!("{path}[{i}]"), item_schema, item))
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array),
            None => Ok(JsonValue::Array(items)),
        },
        (_, value) => Ok(value),
    }
}

fn matches_exactly(target: JsonType, value: &JsonValue) -> bool {
    match (target, value) {
        (JsonType::String, JsonValue::String(_))
        | (JsonType::Boolean, JsonValue::Bool(_))
        | (JsonType::Number, JsonValue::Number(_))
        | (JsonType::Object, JsonValue::Object(_))
        | (JsonType::Array, JsonValue::Array(_)) => true,
        (JsonType::Integer, JsonValue::Number(n)) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

fn loose_convert(target: JsonType, value: &JsonValue) -> Option<JsonValue> {
    match (target, value) {
        (JsonType::Integer, JsonValue::Number(n)) => {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| JsonValue::from(f as i64))
        }
        (JsonType::Integer, JsonValue::String(s)) => s.trim().parse::<i64>().ok().map(JsonValue::from),
        (JsonType::Number, JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number),
        (JsonType::Boolean, JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            _ => None,
        },
        (JsonType::String, JsonValue::Number(n)) => Some(JsonValue::String(n.to_string())),
        (JsonType::String, JsonValue::Bool(b)) => Some(JsonValue::String(b.to_string())),
        _ => None,
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
