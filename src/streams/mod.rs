//! Stream descriptors
//!
//! Every resource type the tap extracts is described once, statically: its
//! identity, primary key, replication mode, the query parameters its
//! endpoint accepts, and how it is windowed and enriched.

mod params;

pub use params::{apply_bookmark, build_parameters};

use crate::error::{Error, Result};
use crate::types::ReplicationMethod;
use crate::window::WindowPlanner;

/// A nested collection fetched per parent record, e.g.
/// `/incidents/{id}/log_entries`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubResource {
    /// Path segment after the parent id
    pub name: &'static str,
    /// Key the response lists its records under
    pub record_key: &'static str,
}

impl SubResource {
    /// Path of this sub-resource for one parent record
    pub fn path(&self, parent_path: &str, parent_id: &str) -> String {
        format!("{parent_path}/{parent_id}/{}", self.name)
    }
}

/// Static description of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Stable identifier, also the endpoint path and response key
    pub stream_id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Primary-key fields
    pub key_properties: &'static [&'static str],
    /// How the stream is replicated
    pub replication_method: ReplicationMethod,
    /// Field the bookmark tracks; set for incremental streams
    pub replication_key: Option<&'static str>,
    /// Replication keys advertised in the catalog
    pub valid_replication_keys: &'static [&'static str],
    /// Query parameters the endpoint accepts as overrides
    pub valid_params: &'static [&'static str],
    /// Parameters that must be present before the sync can run
    pub required_params: &'static [&'static str],
    /// Widest `since`/`until` range the endpoint accepts, in days
    pub max_window_days: Option<i64>,
    /// Collections fetched per record and attached to it
    pub sub_resources: &'static [SubResource],
}

impl StreamDescriptor {
    /// Endpoint path
    pub fn path(&self) -> String {
        format!("/{}", self.stream_id)
    }

    /// Key the endpoint lists records under
    pub fn resource_key(&self) -> &'static str {
        self.stream_id
    }

    /// Whether the stream resumes from a bookmark
    pub fn is_incremental(&self) -> bool {
        self.replication_method == ReplicationMethod::Incremental
    }

    /// Replication key used for bookmarking (incremental streams only)
    pub fn bookmark_key(&self) -> Option<&'static str> {
        if self.is_incremental() {
            self.replication_key
        } else {
            None
        }
    }

    /// Whether an override key is accepted by the endpoint
    pub fn accepts(&self, param: &str) -> bool {
        self.valid_params.contains(&param)
    }

    /// Window planner for streams with a maximum span
    pub fn window_planner(&self) -> Result<Option<WindowPlanner>> {
        self.max_window_days.map(WindowPlanner::days).transpose()
    }
}

/// Incidents, enriched with their log entries and alerts
pub static INCIDENTS: StreamDescriptor = StreamDescriptor {
    stream_id: "incidents",
    name: "IncidentsStream",
    key_properties: &["id"],
    replication_method: ReplicationMethod::Incremental,
    replication_key: Some("last_status_change_at"),
    valid_replication_keys: &["last_status_change_at"],
    valid_params: &[
        "since",
        "until",
        "date_range",
        "statuses[]",
        "incident_key",
        "service_ids[]",
        "team_ids[]",
        "user_ids[]",
        "urgencies[]",
        "time_zone",
        "sort_by",
        "include[]",
    ],
    required_params: &["until"],
    max_window_days: Some(179),
    sub_resources: &[
        SubResource {
            name: "log_entries",
            record_key: "log_entries",
        },
        SubResource {
            name: "alerts",
            record_key: "alerts",
        },
    ],
};

/// Services
pub static SERVICES: StreamDescriptor = StreamDescriptor {
    stream_id: "services",
    name: "ServicesStream",
    key_properties: &["id"],
    replication_method: ReplicationMethod::FullTable,
    replication_key: None,
    valid_replication_keys: &["created_at"],
    valid_params: &["team_ids[]", "time_zone", "sort_by", "query", "include[]"],
    required_params: &[],
    max_window_days: None,
    sub_resources: &[],
};

/// Notifications
pub static NOTIFICATIONS: StreamDescriptor = StreamDescriptor {
    stream_id: "notifications",
    name: "NotificationsStream",
    key_properties: &["id"],
    replication_method: ReplicationMethod::Incremental,
    replication_key: Some("started_at"),
    valid_replication_keys: &["started_at"],
    valid_params: &["time_zone", "since", "until", "filter", "include"],
    required_params: &["since", "until"],
    max_window_days: Some(89),
    sub_resources: &[],
};

/// Escalation policies
pub static ESCALATION_POLICIES: StreamDescriptor = StreamDescriptor {
    stream_id: "escalation_policies",
    name: "EscalationPoliciesStream",
    key_properties: &["id"],
    replication_method: ReplicationMethod::FullTable,
    replication_key: None,
    valid_replication_keys: &[],
    valid_params: &["query", "user_ids[]", "team_ids[]", "include[]", "sort_by"],
    required_params: &[],
    max_window_days: None,
    sub_resources: &[],
};

/// Every stream the tap can extract, in sync order
pub static AVAILABLE_STREAMS: &[&StreamDescriptor] =
    &[&INCIDENTS, &SERVICES, &NOTIFICATIONS, &ESCALATION_POLICIES];

/// Look up a stream by id
pub fn find_stream(stream_id: &str) -> Result<&'static StreamDescriptor> {
    AVAILABLE_STREAMS
        .iter()
        .copied()
        .find(|d| d.stream_id == stream_id)
        .ok_or_else(|| Error::StreamNotFound {
            stream: stream_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_stream() {
        assert_eq!(find_stream("services").unwrap().name, "ServicesStream");
        assert!(matches!(
            find_stream("users").unwrap_err(),
            Error::StreamNotFound { .. }
        ));
    }

    #[test]
    fn test_incremental_streams_have_replication_keys() {
        for descriptor in AVAILABLE_STREAMS {
            if descriptor.is_incremental() {
                let key = descriptor.bookmark_key().unwrap();
                assert!(descriptor.valid_replication_keys.contains(&key));
            } else {
                assert!(descriptor.bookmark_key().is_none());
            }
            assert!(!descriptor.key_properties.is_empty());
        }
    }

    #[test]
    fn test_window_planners() {
        let incidents = INCIDENTS.window_planner().unwrap().unwrap();
        assert_eq!(incidents.max_span(), chrono::Duration::days(179));
        let notifications = NOTIFICATIONS.window_planner().unwrap().unwrap();
        assert_eq!(notifications.max_span(), chrono::Duration::days(89));
        assert!(SERVICES.window_planner().unwrap().is_none());
    }

    #[test]
    fn test_sub_resource_path() {
        let paths: Vec<String> = INCIDENTS
            .sub_resources
            .iter()
            .map(|s| s.path(&INCIDENTS.path(), "P123"))
            .collect();
        assert_eq!(
            paths,
            vec!["/incidents/P123/log_entries", "/incidents/P123/alerts"]
        );
    }

    #[test]
    fn test_accepts() {
        assert!(INCIDENTS.accepts("statuses[]"));
        assert!(!SERVICES.accepts("since"));
        assert!(NOTIFICATIONS.accepts("filter"));
    }
}
