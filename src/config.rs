//! Cluster configuration
//!
//! `ClusterConfig` mirrors the JSON wire form, where mutually exclusive
//! variants are optional sections. `validate` checks every section once
//! and produces a `ValidatedConfig` built from sum types only; any
//! violation is returned as a startup-fatal error instead of defaulted.

use crate::error::{KubedError, Result};
use crate::recycle_bin::RecycleBinSpec;
use crate::retention::{JanitorConfig, JanitorSpec};
use crate::routing::EventForwarderSpec;
use crate::snapshot::{SnapshotConfig, SnapshotSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerSpec {
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub enable_search_index: bool,
}

/// Cluster configuration as loaded from disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshotter: Option<SnapshotConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_bin: Option<RecycleBinSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_forwarder: Option<EventForwarderSpec>,

    #[serde(default)]
    pub enable_config_syncer: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notifier_secret_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub janitors: Vec<JanitorConfig>,

    #[serde(default)]
    pub api_server: ApiServerSpec,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_config_file: String,
}

impl ClusterConfig {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| KubedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "Cluster config loaded");
        Ok(config)
    }

    /// Check every section, turning optional variants into fixed ones
    pub fn validate(self) -> Result<ValidatedConfig> {
        if let Some(forwarder) = &self.event_forwarder {
            forwarder.rules.validate()?;
        }

        if let Some(bin) = &self.recycle_bin {
            bin.validate()?;
        }

        let snapshotter = self
            .snapshotter
            .map(SnapshotSpec::try_from)
            .transpose()?;

        let janitors = self
            .janitors
            .into_iter()
            .map(JanitorSpec::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::info!(
            cluster = %self.cluster_name,
            snapshotter = ?snapshotter.as_ref().map(|s| s.backend.kind()),
            recycle_bin = self.recycle_bin.is_some(),
            forwarder_rules = self.event_forwarder.as_ref().map_or(0, |f| f.rules.rules.len()),
            janitors = janitors.len(),
            "Cluster config validated"
        );

        Ok(ValidatedConfig {
            cluster_name: self.cluster_name,
            snapshotter,
            recycle_bin: self.recycle_bin,
            event_forwarder: self.event_forwarder,
            enable_config_syncer: self.enable_config_syncer,
            notifier_secret_name: self.notifier_secret_name,
            janitors,
            api_server: self.api_server,
            kube_config_file: self.kube_config_file,
        })
    }
}

/// Cluster configuration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub cluster_name: String,
    pub snapshotter: Option<SnapshotSpec>,
    pub recycle_bin: Option<RecycleBinSpec>,
    pub event_forwarder: Option<EventForwarderSpec>,
    pub enable_config_syncer: bool,
    pub notifier_secret_name: String,
    pub janitors: Vec<JanitorSpec>,
    pub api_server: ApiServerSpec,
    pub kube_config_file: String,
}
