//! Core value types for the decision core
//!
//! All serializable types use camelCase JSON for compatibility with the
//! cluster config wire format. Every value here is owned by the caller;
//! nothing in the core keeps references across calls.

use crate::error::{KubedError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of timestamps embedded in artifact identifiers (`20230401T120000`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

const TIMESTAMP_LEN: usize = 15;

/// Resource operation observed by the watch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// A create/delete observed on a watched resource
///
/// `api_group` is empty for the core group and `namespace` is empty for
/// cluster-scoped resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEvent {
    pub operation: Operation,

    #[serde(default)]
    pub api_group: String,

    /// Resource kind, possibly with a subresource (`pods/log`)
    pub resource_kind: String,

    pub resource_name: String,

    #[serde(default)]
    pub namespace: String,

    /// `type` of a Kubernetes Event object (`Normal`, `Warning`), when the
    /// watched resource is itself an event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl ResourceEvent {
    pub fn new(
        operation: Operation,
        api_group: impl Into<String>,
        resource_kind: impl Into<String>,
        resource_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            api_group: api_group.into(),
            resource_kind: resource_kind.into(),
            resource_name: resource_name.into(),
            namespace: namespace.into(),
            event_type: None,
        }
    }

    /// Shorthand for a create event
    pub fn created(
        api_group: impl Into<String>,
        resource_kind: impl Into<String>,
        resource_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::new(Operation::Create, api_group, resource_kind, resource_name, namespace)
    }

    /// Shorthand for a delete event
    pub fn deleted(
        api_group: impl Into<String>,
        resource_kind: impl Into<String>,
        resource_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::new(Operation::Delete, api_group, resource_kind, resource_name, namespace)
    }

    /// Attach the Kubernetes Event `type`
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn is_namespaced(&self) -> bool {
        !self.namespace.is_empty()
    }
}

/// Notification destination, opaque to the core
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    /// To whom the notification is sent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,

    /// Key of the notifier implementation that delivers it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notifier: String,
}

impl Receiver {
    pub fn new<I, S>(notifier: impl Into<String>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to: to.into_iter().map(Into::into).collect(),
            notifier: notifier.into(),
        }
    }
}

/// A time-stamped artifact kept by a snapshotter, recycle bin, or log store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetainedArtifact {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl RetainedArtifact {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }

    /// Build an artifact whose id is its creation timestamp
    pub fn from_timestamp_id(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let created_at = parse_timestamp(&id)?;
        Ok(Self { id, created_at })
    }
}

/// Render a timestamp in the artifact id layout
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `YYYYMMDDThhmmss` timestamp, rejecting any other layout
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let invalid = |reason: &str| KubedError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.len() != TIMESTAMP_LEN || !value.is_ascii() || value.as_bytes()[8] != b'T' {
        return Err(invalid("expected layout YYYYMMDDThhmmss"));
    }

    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| invalid(&e.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_operation_wire_form() {
        assert_eq!(serde_json::to_string(&Operation::Create).unwrap(), "\"CREATE\"");
        let parsed: Operation = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(parsed, Operation::Delete);
        assert!(serde_json::from_str::<Operation>("\"UPDATE\"").is_err());
    }

    #[test]
    fn test_event_constructors() {
        let event = ResourceEvent::deleted("", "pods", "p1", "prod");
        assert_eq!(event.operation, Operation::Delete);
        assert_eq!(event.api_group, "");
        assert!(event.is_namespaced());
        assert!(event.event_type.is_none());

        let node = ResourceEvent::created("", "nodes", "worker-1", "");
        assert!(!node.is_namespaced());
    }

    #[test]
    fn test_event_deserialize_defaults() {
        let json = r#"{"operation":"CREATE","resourceKind":"nodes","resourceName":"n1"}"#;
        let event: ResourceEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.api_group, "");
        assert_eq!(event.namespace, "");
    }

    #[test]
    fn test_receiver_identity() {
        let a = Receiver::new("mailgun", ["ops@example.com"]);
        let b = Receiver::new("mailgun", vec!["ops@example.com".to_string()]);
        assert_eq!(a, b);
        assert_ne!(a, Receiver::new("slack", ["ops@example.com"]));
    }

    #[test]
    fn test_receiver_skips_empty_fields() {
        let json = serde_json::to_string(&Receiver::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_timestamp_format_and_parse() {
        let at = Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "20230401T120000");

        let parsed = parse_timestamp("20230401T120000").unwrap();
        assert_eq!(parsed, at);
        assert_eq!(parsed.hour(), 12);
    }

    #[test]
    fn test_parse_timestamp_rejects_other_layouts() {
        assert!(parse_timestamp("2023-04-01T12:00:00").is_err());
        assert!(parse_timestamp("20230401120000").is_err());
        assert!(parse_timestamp("20230401T1200").is_err());
        assert!(parse_timestamp("20231301T120000").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_artifact_from_timestamp_id() {
        let artifact = RetainedArtifact::from_timestamp_id("20230401T120000").unwrap();
        assert_eq!(artifact.id, "20230401T120000");
        assert_eq!(
            artifact.created_at,
            Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap()
        );

        let err = RetainedArtifact::from_timestamp_id("backup-1").unwrap_err();
        assert!(matches!(err, KubedError::InvalidTimestamp { .. }));
    }
}
