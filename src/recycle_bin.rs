//! Recycle bin for deleted objects
//!
//! Deleted objects are kept as `<kind>/<namespace>/<name>.<timestamp>.yaml`
//! entries under the bin path and purged once older than the bin TTL.

use crate::error::ConfigError;
use crate::retention::expired_ids;
use crate::ttl::TtlSpec;
use crate::types::{
    format_timestamp, parse_timestamp, Operation, Receiver, ResourceEvent, RetainedArtifact,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ENTRY_EXTENSION: &str = ".yaml";

/// Namespace segment used for cluster-scoped objects
const CLUSTER_SCOPE: &str = "_cluster";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecycleBinSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default)]
    pub ttl: TtlSpec,

    /// Also keep the previous version of updated objects (handled by the
    /// update watcher)
    #[serde(default)]
    pub handle_updates: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<Receiver>,
}

impl RecycleBinSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "recycleBin.path",
            });
        }
        Ok(())
    }

    /// Deleted objects go to the bin, created ones never do
    pub fn should_recycle(&self, event: &ResourceEvent) -> bool {
        event.operation == Operation::Delete
    }

    /// Relative entry name for an object deleted at `at`
    pub fn entry_name(&self, event: &ResourceEvent, at: DateTime<Utc>) -> String {
        let namespace = if event.namespace.is_empty() {
            CLUSTER_SCOPE
        } else {
            event.namespace.as_str()
        };
        let kind = event.resource_kind.replace('/', "_");

        format!(
            "{}/{}/{}.{}{}",
            kind,
            namespace,
            event.resource_name,
            format_timestamp(at),
            ENTRY_EXTENSION
        )
    }

    /// Ids of bin entries past the TTL; unparseable names are skipped
    pub fn expired_entries<I, S>(&self, names: I, now: DateTime<Utc>) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<RetainedArtifact> = names
            .into_iter()
            .filter_map(|name| parse_entry_name(name.as_ref()))
            .collect();

        expired_ids(self.ttl, &entries, now)
            .map(str::to_string)
            .collect()
    }
}

/// Recover the deletion time embedded in a bin entry name
pub fn parse_entry_name(name: &str) -> Option<RetainedArtifact> {
    let stem = name.strip_suffix(ENTRY_EXTENSION)?;
    let (_, timestamp) = stem.rsplit_once('.')?;
    let created_at = parse_timestamp(timestamp).ok()?;
    Some(RetainedArtifact::new(name, created_at))
}
