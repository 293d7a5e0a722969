//! Periodic cluster snapshots
//!
//! Each run is stored under a name equal to its start time in the
//! artifact timestamp layout. Expiry parses that name back, so only
//! names in exactly that layout are ever considered for deletion.

use crate::backend::{BackendConfig, BackendDescriptor};
use crate::error::ConfigError;
use crate::retention::expired_ids;
use crate::ttl::TtlSpec;
use crate::types::{format_timestamp, RetainedArtifact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshotter block as written in the cluster config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule: String,

    #[serde(default)]
    pub sanitize: bool,

    #[serde(default)]
    pub overwrite: bool,

    #[serde(default)]
    pub ttl: TtlSpec,

    #[serde(flatten)]
    pub backend: BackendConfig,
}

/// A snapshotter with a validated storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSpec {
    pub schedule: String,

    /// Strip cluster-specific metadata from dumped objects
    pub sanitize: bool,

    /// Write every run to the same location instead of a timestamped one
    pub overwrite: bool,

    pub ttl: TtlSpec,
    pub backend: BackendDescriptor,
}

impl SnapshotSpec {
    /// Name of the snapshot taken at `at`; `None` when runs overwrite in place
    pub fn snapshot_name(&self, at: DateTime<Utc>) -> Option<String> {
        (!self.overwrite).then(|| format_timestamp(at))
    }

    /// Existing snapshot names past the TTL, in input order
    ///
    /// Names not in the timestamp layout are left alone.
    pub fn expired_snapshots<I, S>(&self, names: I, now: DateTime<Utc>) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.overwrite || self.ttl.is_immortal() {
            return Vec::new();
        }

        let snapshots: Vec<RetainedArtifact> = names
            .into_iter()
            .filter_map(|name| match RetainedArtifact::from_timestamp_id(name.as_ref()) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping foreign snapshot entry");
                    None
                }
            })
            .collect();

        expired_ids(self.ttl, &snapshots, now)
            .map(str::to_string)
            .collect()
    }
}

impl TryFrom<SnapshotConfig> for SnapshotSpec {
    type Error = ConfigError;

    fn try_from(config: SnapshotConfig) -> Result<Self, Self::Error> {
        if config.schedule.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "snapshotter.schedule",
            });
        }

        Ok(Self {
            backend: BackendDescriptor::try_from(config.backend)?,
            schedule: config.schedule,
            sanitize: config.sanitize,
            overwrite: config.overwrite,
            ttl: config.ttl,
        })
    }
}
