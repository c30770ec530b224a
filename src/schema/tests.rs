//! Schema loading and coercion tests

use super::*;
use crate::error::Error;
use crate::streams::AVAILABLE_STREAMS;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use test_case::test_case;

fn schema(properties: serde_json::Value) -> JsonSchema {
    serde_json::from_value(json!({"type": ["null", "object"], "properties": properties})).unwrap()
}

// ============================================================================
// Loader Tests
// ============================================================================

#[test]
fn test_every_stream_has_bundled_schema() {
    let loader = SchemaLoader::bundled();
    for descriptor in AVAILABLE_STREAMS {
        let schema = loader.load(descriptor.stream_id).unwrap().typed;
        for key in descriptor.key_properties {
            assert!(schema.get_property(key).is_some(), "{} lacks {key}", descriptor.stream_id);
        }
        if let Some(key) = descriptor.replication_key {
            assert!(schema.get_property(key).unwrap().is_date_time());
        }
    }
}

#[test]
fn test_incident_schema_declares_enrichment() {
    let schema = SchemaLoader::bundled().load("incidents").unwrap().typed;
    for sub in ["log_entries", "alerts"] {
        let property = schema.get_property(sub).unwrap();
        assert!(property.json_type.as_ref().unwrap().allows(JsonType::Array));
        assert!(property.items.is_some());
    }
}

#[test]
fn test_unknown_stream_schema() {
    let err = SchemaLoader::bundled().load("users").unwrap_err();
    assert!(matches!(err, Error::SchemaNotFound { .. }));
}

#[test]
fn test_override_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("services.json"),
        r#"{"type": "object", "properties": {"id": {"type": "string"}}}"#,
    )
    .unwrap();

    let loader = SchemaLoader::with_overrides(dir.path());
    let services = loader.load("services").unwrap();
    assert_eq!(services.typed.properties.len(), 1);

    // Streams without an override file fall back to the bundled schema
    let notifications = loader.load("notifications").unwrap();
    assert!(notifications.typed.get_property("started_at").is_some());
}

#[test]
fn test_invalid_override_is_config_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("services.json"), "{").unwrap();
    let err = SchemaLoader::with_overrides(dir.path()).load("services").unwrap_err();
    assert!(err.is_config());
}

// ============================================================================
// Type Tests
// ============================================================================

#[test]
fn test_type_lists() {
    let single: JsonTypeOrArray = serde_json::from_value(json!("integer")).unwrap();
    assert!(!single.is_nullable());
    assert!(single.allows(JsonType::Integer));

    let multiple: JsonTypeOrArray = serde_json::from_value(json!(["null", "string"])).unwrap();
    assert!(multiple.is_nullable());
    assert_eq!(multiple.non_null().collect::<Vec<_>>(), vec![JsonType::String]);
    assert_eq!(multiple.to_string(), "null|string");
}

#[test]
fn test_override_keeps_every_keyword() {
    let document = json!({
        "type": ["null", "object"],
        "required": ["id"],
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "status": {"type": ["null", "string"], "enum": ["active", "warning", "critical"]},
            "teams": {"anyOf": [{"type": "null"}, {"type": "array", "items": {"type": "string"}}]}
        }
    });
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("services.json"), document.to_string()).unwrap();

    let services = SchemaLoader::with_overrides(dir.path()).load("services").unwrap();
    assert_eq!(services.document, document);
    assert_eq!(services.typed.properties.len(), 3);
    assert!(services.typed.get_property("teams").unwrap().is_nullable());
}

#[test]
fn test_nested_properties_parse() {
    let schema = schema(json!({
        "acknowledgements": {
            "type": ["null", "array"],
            "items": {"type": ["null", "object"], "properties": {"at": {"type": "string", "format": "date-time"}}}
        }
    }));

    let property = schema.get_property("acknowledgements").unwrap();
    assert!(property.is_nullable());
    let items = property.items.as_ref().unwrap();
    assert!(items.properties.as_ref().unwrap()["at"].is_date_time());
}

// ============================================================================
// Coercion Tests
// ============================================================================

#[test]
fn test_coerce_scalars() {
    let schema = schema(json!({
        "count": {"type": ["null", "integer"]},
        "ratio": {"type": "number"},
        "urgent": {"type": ["null", "boolean"]},
        "number": {"type": ["null", "string"]},
        "flag": {"type": "string"}
    }));

    let record = json!({"count": "42", "ratio": "0.5", "urgent": "TRUE", "number": 7, "flag": false});
    let coerced = coerce_record("s", &schema, record).unwrap();

    assert_eq!(
        coerced,
        json!({"count": 42, "ratio": 0.5, "urgent": true, "number": "7", "flag": "false"})
    );
}

#[test]
fn test_whole_float_becomes_integer() {
    let schema = schema(json!({"n": {"type": "integer"}}));
    let coerced = coerce_record("s", &schema, json!({"n": 3.0})).unwrap();
    assert_eq!(coerced, json!({"n": 3}));
}

#[test]
fn test_exact_type_preferred_over_conversion() {
    let schema = schema(json!({"v": {"type": ["null", "integer", "string"]}}));
    let coerced = coerce_record("s", &schema, json!({"v": "5"})).unwrap();
    assert_eq!(coerced, json!({"v": "5"}));
}

#[test_case("2020-01-01T10:00:00+02:00", "2020-01-01T08:00:00Z" ; "offset normalized")]
#[test_case("2020-01-01T08:00:00Z", "2020-01-01T08:00:00Z" ; "already utc")]
#[test_case("2020-01-01T08:00:00.250Z", "2020-01-01T08:00:00.250Z" ; "fraction kept")]
#[test_case("2020-01-01", "2020-01-01T00:00:00Z" ; "date only")]
fn test_date_time_normalized(input: &str, expected: &str) {
    let schema = schema(json!({"at": {"type": ["null", "string"], "format": "date-time"}}));
    let coerced = coerce_record("s", &schema, json!({"at": input})).unwrap();
    assert_eq!(coerced["at"], expected);
}

#[test]
fn test_unknown_properties_dropped_recursively() {
    let schema = schema(json!({
        "id": {"type": "string"},
        "service": {"type": ["null", "object"], "properties": {"id": {"type": "string"}}},
        "teams": {"type": ["null", "array"], "items": {"type": "object", "properties": {"id": {"type": "string"}}}}
    }));
    let record = json!({
        "id": "P1",
        "junk": 1,
        "service": {"id": "S1", "extra": true},
        "teams": [{"id": "T1", "name": "x"}, {"id": "T2"}]
    });

    let coerced = coerce_record("incidents", &schema, record).unwrap();
    assert_eq!(
        coerced,
        json!({"id": "P1", "service": {"id": "S1"}, "teams": [{"id": "T1"}, {"id": "T2"}]})
    );
}

#[test]
fn test_untyped_and_open_values_pass_through() {
    let schema = schema(json!({
        "details": {"type": ["null", "object", "string"]},
        "anything": {}
    }));
    let record = json!({"details": {"k": [1, 2]}, "anything": [true]});
    let coerced = coerce_record("s", &schema, record.clone()).unwrap();
    assert_eq!(coerced, record);
}

#[test]
fn test_null_handling() {
    let schema = schema(json!({
        "optional": {"type": ["null", "string"]},
        "required": {"type": "string"}
    }));

    let ok = coerce_record("s", &schema, json!({"optional": null})).unwrap();
    assert_eq!(ok, json!({"optional": null}));

    let err = coerce_record("s", &schema, json!({"required": null})).unwrap_err();
    match err {
        Error::SchemaMismatch { stream, path, .. } => {
            assert_eq!(stream, "s");
            assert_eq!(path, "$.required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mismatch_reports_nested_path() {
    let schema = schema(json!({
        "rules": {"type": "array", "items": {"type": "object", "properties": {"delay": {"type": "integer"}}}}
    }));
    let record = json!({"rules": [{"delay": 5}, {"delay": "soon"}]});

    let err = coerce_record("escalation_policies", &schema, record).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref path, .. } if path == "$.rules[1].delay"));
}

#[test]
fn test_bad_date_time_is_mismatch() {
    let schema = schema(json!({"at": {"type": "string", "format": "date-time"}}));
    let err = coerce_record("s", &schema, json!({"at": "not a time"})).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn test_non_object_record_rejected() {
    let err = coerce_record("s", &schema(json!({})), json!([1, 2])).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { ref path, .. } if path == "$"));
}
