//! Request parameter assembly
//!
//! Merge order: defaults, then per-stream overrides from the config, then
//! required parameters still missing.

use super::StreamDescriptor;
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::pagination::RequestParameters;
use crate::types::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};

/// Build the parameters of one stream-run
///
/// Fails with [`Error::UnknownParameter`] when an override names a
/// parameter the endpoint does not accept, and [`Error::MissingParameter`]
/// when a required parameter cannot be filled in. `until` defaults to `now`.
pub fn build_parameters(
    descriptor: &StreamDescriptor,
    config: &TapConfig,
    now: DateTime<Utc>,
) -> Result<RequestParameters> {
    let mut params = RequestParameters::new(config.limit);
    params.insert("time_zone", config.time_zone.as_str())?;

    if descriptor.accepts("since") {
        params.insert("since", format_timestamp(config.since_timestamp()?))?;
    }
    if descriptor.accepts("until") {
        if let Some(until) = config.until_timestamp()? {
            params.insert("until", format_timestamp(until))?;
        }
    }

    if let Some(overrides) = config.stream_overrides(descriptor.stream_id) {
        for (key, value) in overrides {
            if !descriptor.accepts(key) {
                return Err(Error::UnknownParameter {
                    stream: descriptor.stream_id.to_string(),
                    param: key.clone(),
                });
            }
            params.insert(key.clone(), value.clone())?;
        }
    }

    for &param in descriptor.required_params {
        if params.contains(param) {
            continue;
        }
        if param == "until" {
            params.insert("until", format_timestamp(now))?;
        } else {
            return Err(Error::MissingParameter {
                stream: descriptor.stream_id.to_string(),
                param: param.to_string(),
            });
        }
    }

    Ok(params)
}

/// Start an incremental run at the committed bookmark
///
/// `since` moves forward to the bookmark when the bookmark is later; it
/// never moves backwards. Returns whether `since` changed.
pub fn apply_bookmark(
    params: &mut RequestParameters,
    committed: Option<DateTime<Utc>>,
) -> Result<bool> {
    let Some(committed) = committed else {
        return Ok(false);
    };

    let current = params.get_str("since").and_then(parse_timestamp);
    if current.is_some_and(|since| since >= committed) {
        return Ok(false);
    }

    params.insert("since", format_timestamp(committed))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{ESCALATION_POLICIES, INCIDENTS, NOTIFICATIONS, SERVICES};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()
    }

    fn config(extra: serde_json::Value) -> TapConfig {
        let mut base = json!({
            "token": "t",
            "email": "ops@example.com",
            "since": "2021-01-01T00:00:00Z"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        TapConfig::from_json(&base.to_string()).unwrap()
    }

    #[test]
    fn test_defaults_for_windowed_stream() {
        let params = build_parameters(&INCIDENTS, &config(json!({})), now()).unwrap();

        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.get_str("time_zone"), Some("UTC"));
        assert_eq!(params.get_str("since"), Some("2021-01-01T00:00:00Z"));
        assert_eq!(params.get_str("until"), Some("2021-06-01T12:00:00Z"));
    }

    #[test]
    fn test_configured_until_wins_over_now() {
        let cfg = config(json!({"until": "2021-03-01T00:00:00Z", "limit": 25}));
        let params = build_parameters(&NOTIFICATIONS, &cfg, now()).unwrap();
        assert_eq!(params.get_str("until"), Some("2021-03-01T00:00:00Z"));
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn test_since_not_sent_where_unsupported() {
        let params = build_parameters(&SERVICES, &config(json!({})), now()).unwrap();
        assert!(!params.contains("since"));
        assert!(!params.contains("until"));
        assert_eq!(params.get_str("time_zone"), Some("UTC"));
    }

    #[test]
    fn test_overrides_are_merged() {
        let cfg = config(json!({
            "streams": {"incidents": {"statuses[]": ["resolved"], "until": "2021-02-01T00:00:00Z"}}
        }));
        let params = build_parameters(&INCIDENTS, &cfg, now()).unwrap();
        assert_eq!(params.get("statuses[]"), Some(&json!(["resolved"])));
        assert_eq!(params.get_str("until"), Some("2021-02-01T00:00:00Z"));
    }

    #[test]
    fn test_unknown_override_rejected() {
        let cfg = config(json!({"streams": {"services": {"since": "2021-01-01"}}}));
        let err = build_parameters(&SERVICES, &cfg, now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "/services endpoint does not support 'since' parameter"
        );
        assert!(err.is_config());
    }

    #[test]
    fn test_missing_required_parameter() {
        static NEEDS_QUERY: StreamDescriptor = StreamDescriptor {
            stream_id: "escalation_policies",
            name: "EscalationPoliciesStream",
            key_properties: &["id"],
            replication_method: crate::types::ReplicationMethod::FullTable,
            replication_key: None,
            valid_replication_keys: &[],
            valid_params: &["query"],
            required_params: &["query"],
            max_window_days: None,
            sub_resources: &[],
        };
        assert_eq!(NEEDS_QUERY.stream_id, ESCALATION_POLICIES.stream_id);
        let err = build_parameters(&NEEDS_QUERY, &config(json!({})), now()).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { ref param, .. } if param == "query"));

        let cfg = config(json!({"streams": {"escalation_policies": {"query": "db"}}}));
        assert!(build_parameters(&NEEDS_QUERY, &cfg, now()).is_ok());
    }

    #[test]
    fn test_apply_bookmark_only_moves_forward() {
        let mut params = build_parameters(&NOTIFICATIONS, &config(json!({})), now()).unwrap();

        assert!(!apply_bookmark(&mut params, None).unwrap());

        let earlier = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        assert!(!apply_bookmark(&mut params, Some(earlier)).unwrap());
        assert_eq!(params.get_str("since"), Some("2021-01-01T00:00:00Z"));

        let later = Utc.with_ymd_and_hms(2021, 4, 1, 0, 0, 0).unwrap();
        assert!(apply_bookmark(&mut params, Some(later)).unwrap());
        assert_eq!(params.get_str("since"), Some("2021-04-01T00:00:00Z"));
    }
}
