//! Stream schema loading
//!
//! Schemas ship inside the binary; a directory of `<stream_id>.json` files
//! can override any of them.

use super::types::StreamSchema;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Schemas embedded in the binary, keyed by stream id
pub static BUNDLED_SCHEMAS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("incidents", include_str!("../../schemas/incidents.json"));
    m.insert("services", include_str!("../../schemas/services.json"));
    m.insert("notifications", include_str!("../../schemas/notifications.json"));
    m.insert(
        "escalation_policies",
        include_str!("../../schemas/escalation_policies.json"),
    );
    m
});

/// Resolves the schema of a stream
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    overrides: Option<PathBuf>,
}

impl SchemaLoader {
    /// Loader using only the bundled schemas
    pub fn bundled() -> Self {
        Self::default()
    }

    /// Loader preferring `<dir>/<stream_id>.json` over the bundled schema
    pub fn with_overrides(dir: impl AsRef<Path>) -> Self {
        Self {
            overrides: Some(dir.as_ref().to_path_buf()),
        }
    }

    /// Load and parse the schema of `stream_id`
    pub fn load(&self, stream_id: &str) -> Result<StreamSchema> {
        if let Some(ref dir) = self.overrides {
            let path = dir.join(format!("{stream_id}.json"));
            if path.is_file() {
                debug!(stream = stream_id, path = %path.display(), "Loading schema override");
                let contents = std::fs::read_to_string(&path)?;
                return parse(stream_id, &contents);
            }
        }

        let source = BUNDLED_SCHEMAS
            .get(stream_id)
            .ok_or_else(|| Error::SchemaNotFound {
                stream: stream_id.to_string(),
            })?;
        parse(stream_id, source)
    }
}

fn parse(stream_id: &str, contents: &str) -> Result<StreamSchema> {
    serde_json::from_str(contents)
        .and_then(StreamSchema::from_value)
        .map_err(|e| Error::config(format!("Invalid schema for stream '{stream_id}': {e}")))
}
