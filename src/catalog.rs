//! Discovery catalog
//!
//! Discovery describes every available stream; the caller edits the
//! catalog to select streams and hands it back for the sync.

use crate::error::{Error, Result};
use crate::schema::SchemaLoader;
use crate::streams::{find_stream, StreamDescriptor, AVAILABLE_STREAMS};
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

/// Metadata attached to one breadcrumb (`[]` for the stream itself,
/// `["properties", <field>]` for a field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path into the schema
    pub breadcrumb: Vec<String>,
    /// Metadata values
    pub metadata: JsonObject,
}

/// One stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream id
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// JSON schema
    pub schema: JsonValue,
    /// Primary-key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Replication key, for incremental streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// Replication method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<ReplicationMethod>,
    /// Legacy top-level selection flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// Stream and field metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Describe a stream with its schema
    pub fn describe(descriptor: &StreamDescriptor, schema: JsonValue) -> Self {
        let metadata = standard_metadata(descriptor, &schema);
        Self {
            tap_stream_id: descriptor.stream_id.to_string(),
            stream: descriptor.name.to_string(),
            schema,
            key_properties: descriptor.key_properties.iter().map(ToString::to_string).collect(),
            replication_key: descriptor.bookmark_key().map(ToString::to_string),
            replication_method: Some(descriptor.replication_method),
            selected: None,
            metadata,
        }
    }

    /// Metadata of the stream itself
    pub fn root_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Whether the caller selected this stream
    pub fn is_selected(&self) -> bool {
        let by_metadata = self
            .root_metadata()
            .and_then(|m| m.get("selected"))
            .and_then(JsonValue::as_bool);
        by_metadata == Some(true) || self.selected == Some(true)
    }

    /// Mark the stream selected
    pub fn select(&mut self) {
        match self.metadata.iter_mut().find(|m| m.breadcrumb.is_empty()) {
            Some(root) => {
                root.metadata.insert("selected".to_string(), JsonValue::Bool(true));
            }
            None => {
                let mut metadata = JsonObject::new();
                metadata.insert("selected".to_string(), JsonValue::Bool(true));
                self.metadata.push(MetadataEntry {
                    breadcrumb: Vec::new(),
                    metadata,
                });
            }
        }
    }
}

/// A full catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams, in sync order
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Describe every available stream
    pub fn discover(loader: &SchemaLoader) -> Result<Self> {
        let streams = AVAILABLE_STREAMS
            .iter()
            .map(|descriptor| {
                let schema = loader.load(descriptor.stream_id)?;
                Ok(CatalogEntry::describe(descriptor, schema.document))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { streams })
    }

    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Failed to parse catalog: {e}")))
    }

    /// Look up an entry by stream id
    pub fn get(&self, stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|e| e.tap_stream_id == stream_id)
    }

    /// Descriptors of the selected streams, in catalog order
    pub fn selected_streams(&self) -> Result<Vec<&'static StreamDescriptor>> {
        self.streams
            .iter()
            .filter(|entry| entry.is_selected())
            .map(|entry| find_stream(&entry.tap_stream_id))
            .collect()
    }

    /// Selected streams, starting from the one an interrupted run was on
    ///
    /// Streams before `currently_syncing` move to the end, so a resumed run
    /// finishes the interrupted stream first and still visits every stream.
    pub fn resume_order(&self, currently_syncing: Option<&str>) -> Result<Vec<&'static StreamDescriptor>> {
        let mut streams = self.selected_streams()?;
        if let Some(current) = currently_syncing {
            if let Some(pos) = streams.iter().position(|d| d.stream_id == current) {
                streams.rotate_left(pos);
            }
        }
        Ok(streams)
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Metadata the way Singer's standard metadata lays it out
fn standard_metadata(descriptor: &StreamDescriptor, schema: &JsonValue) -> Vec<MetadataEntry> {
    let mut root = JsonObject::new();
    root.insert("table-key-properties".to_string(), json!(descriptor.key_properties));
    root.insert(
        "forced-replication-method".to_string(),
        json!(descriptor.replication_method),
    );
    if !descriptor.valid_replication_keys.is_empty() {
        root.insert(
            "valid-replication-keys".to_string(),
            json!(descriptor.valid_replication_keys),
        );
    }
    root.insert("inclusion".to_string(), json!("available"));
    root.insert("selected-by-default".to_string(), json!(true));

    let mut entries = vec![MetadataEntry {
        breadcrumb: Vec::new(),
        metadata: root,
    }];

    let automatic = |field: &str| {
        descriptor.key_properties.contains(&field)
            || (descriptor.replication_method == ReplicationMethod::Incremental
                && descriptor.replication_key == Some(field))
    };

    if let Some(properties) = schema.get("properties").and_then(JsonValue::as_object) {
        for field in properties.keys() {
            let inclusion = if automatic(field) { "automatic" } else { "available" };
            let mut metadata = JsonObject::new();
            metadata.insert("inclusion".to_string(), json!(inclusion));
            entries.push(MetadataEntry {
                breadcrumb: vec!["properties".to_string(), field.clone()],
                metadata,
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn discovered() -> Catalog {
        Catalog::discover(&SchemaLoader::bundled()).unwrap()
    }

    #[test]
    fn test_discover_lists_every_stream() {
        let catalog = discovered();
        let ids: Vec<&str> = catalog.streams.iter().map(|e| e.tap_stream_id.as_str()).collect();
        assert_eq!(ids, vec!["incidents", "services", "notifications", "escalation_policies"]);
        assert!(catalog.streams.iter().all(|e| !e.is_selected()));
    }

    #[test]
    fn test_incremental_entry_metadata() {
        let catalog = discovered();
        let entry = catalog.get("notifications").unwrap();
        assert_eq!(entry.stream, "NotificationsStream");
        assert_eq!(entry.replication_key.as_deref(), Some("started_at"));
        assert_eq!(entry.replication_method, Some(ReplicationMethod::Incremental));

        let root = entry.root_metadata().unwrap();
        assert_eq!(root["forced-replication-method"], json!("INCREMENTAL"));
        assert_eq!(root["valid-replication-keys"], json!(["started_at"]));
        assert_eq!(root["table-key-properties"], json!(["id"]));

        let inclusion = |field: &str| {
            entry
                .metadata
                .iter()
                .find(|m| m.breadcrumb == ["properties", field])
                .map(|m| m.metadata["inclusion"].clone())
        };
        assert_eq!(inclusion("id"), Some(json!("automatic")));
        assert_eq!(inclusion("started_at"), Some(json!("automatic")));
        assert_eq!(inclusion("address"), Some(json!("available")));
    }

    #[test]
    fn test_full_table_entry_advertises_key() {
        let catalog = discovered();
        let services = catalog.get("services").unwrap();
        assert!(services.replication_key.is_none());
        let root = services.root_metadata().unwrap();
        assert_eq!(root["forced-replication-method"], json!("FULL_TABLE"));
        assert_eq!(root["valid-replication-keys"], json!(["created_at"]));
    }

    #[test]
    fn test_selection_by_metadata_and_legacy_flag() {
        let mut catalog = discovered();
        catalog.streams[2].select();
        catalog.streams[1].selected = Some(true);

        let selected: Vec<&str> = catalog
            .selected_streams()
            .unwrap()
            .iter()
            .map(|d| d.stream_id)
            .collect();
        assert_eq!(selected, vec!["services", "notifications"]);
    }

    #[test]
    fn test_resume_starts_at_interrupted_stream() {
        let mut catalog = discovered();
        catalog.streams.iter_mut().for_each(CatalogEntry::select);

        let ids = |order: Vec<&'static StreamDescriptor>| {
            order.iter().map(|d| d.stream_id).collect::<Vec<_>>()
        };
        assert_eq!(
            ids(catalog.resume_order(Some("notifications")).unwrap()),
            vec!["notifications", "escalation_policies", "incidents", "services"]
        );
        assert_eq!(
            ids(catalog.resume_order(Some("users")).unwrap()),
            vec!["incidents", "services", "notifications", "escalation_policies"]
        );
        assert_eq!(ids(catalog.resume_order(None).unwrap())[0], "incidents");
    }

    #[test]
    fn test_catalog_round_trip() {
        let mut catalog = discovered();
        catalog.streams[0].select();
        let parsed = Catalog::from_json(&catalog.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, catalog);
        assert!(parsed.get("incidents").unwrap().is_selected());
    }

    #[test]
    fn test_minimal_catalog_input() {
        let json = r#"{"streams": [
            {"tap_stream_id": "escalation_policies", "stream": "EscalationPoliciesStream",
             "schema": {}, "metadata": [{"breadcrumb": [], "metadata": {"selected": true}}]},
            {"tap_stream_id": "services", "stream": "ServicesStream", "schema": {},
             "metadata": [{"breadcrumb": [], "metadata": {"selected": false}}]}
        ]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        let selected = catalog.selected_streams().unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].stream_id, "escalation_policies");
    }

    #[test]
    fn test_unknown_selected_stream_is_error() {
        let json = r#"{"streams": [{"tap_stream_id": "users", "stream": "users",
            "schema": {}, "selected": true}]}"#;
        let err = Catalog::from_json(json).unwrap().selected_streams().unwrap_err();
        assert!(matches!(err, Error::StreamNotFound { .. }));
    }

    #[test]
    fn test_bad_catalog_json() {
        assert!(Catalog::from_json("[]").unwrap_err().is_config());
    }
}
