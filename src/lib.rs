//! # kubed-core
//!
//! Event routing policy and retention decisions for a cluster-utility operator.
//!
//! ## Overview
//!
//! `kubed-core` answers four questions for the operator's outer layers:
//! does a resource event match the forwarding policy, which receivers get
//! it, has a retained artifact outlived its TTL, and which storage backend
//! is active for snapshot uploads. The decisions are pure functions over
//! caller-owned values; I/O lives behind the `Notifier` and
//! `ArtifactStore` traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use kubed_core::{ClusterConfig, ResourceEvent};
//!
//! # fn example() -> kubed_core::Result<()> {
//! let config = ClusterConfig::from_json(r#"{
//!     "eventForwarder": {
//!         "receivers": [{"notifier": "mailgun", "to": ["ops@example.com"]}],
//!         "rules": [{"operation": ["DELETE"], "namespaces": ["prod"]}]
//!     }
//! }"#)?
//! .validate()?;
//!
//! let forwarder = config.event_forwarder.unwrap_or_default();
//! let receivers = forwarder.route(&ResourceEvent::deleted("", "pods", "web-0", "prod"));
//! assert_eq!(receivers.len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - `ttl`: TTL clock shared by snapshots, recycle bin, and janitors
//! - `namespace`, `policy`: allow-lists and policy rule matching
//! - `routing`: legacy category toggles composed with policy rules
//! - `retention`, `snapshot`, `recycle_bin`: expiry classification
//! - `backend`: exactly-one storage backend selection
//! - `config`: cluster config loading and one-shot validation
//! - `forwarder`, `janitor`: drive notifiers and artifact stores

pub mod backend;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod janitor;
pub mod namespace;
pub mod policy;
pub mod provider;
pub mod recycle_bin;
pub mod retention;
pub mod routing;
pub mod snapshot;
pub mod ttl;
pub mod types;

// Re-export core types
pub use backend::{BackendConfig, BackendDescriptor, StorageBackend, StorageCredentials};
pub use config::{ClusterConfig, ValidatedConfig};
pub use error::{ConfigError, KubedError, Result};
pub use forwarder::EventForwarder;
pub use janitor::{SweepReport, Sweeper};
pub use namespace::ForwarderSpec;
pub use policy::{GroupResources, Policy, PolicyRule};
pub use provider::{ArtifactStore, Notifier};
pub use recycle_bin::RecycleBinSpec;
pub use retention::{expired_entries, JanitorBackend, JanitorConfig, JanitorKind, JanitorSpec};
pub use routing::{EventForwarderSpec, LegacyCategory};
pub use snapshot::{SnapshotConfig, SnapshotSpec};
pub use ttl::{is_expired, TtlSpec};
pub use types::{Operation, Receiver, ResourceEvent, RetainedArtifact, TIMESTAMP_FORMAT};

// Re-export in-memory collaborators for convenience
pub use provider::memory::{MemoryArtifactStore, MemoryNotifier};
