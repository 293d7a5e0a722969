//! Error types for kubed-core

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the decision core and its collaborator seams
#[derive(Debug, Error)]
pub enum KubedError {
    /// Invalid cluster configuration (startup-fatal)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a configuration file failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact identifier does not carry a `YYYYMMDDThhmmss` timestamp
    #[error("Invalid artifact timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Notifier delivery failure
    #[error("Notifier '{notifier}' failed: {reason}")]
    Notifier { notifier: String, reason: String },

    /// Artifact store failure (list or delete)
    #[error("Artifact store '{store}' failed: {reason}")]
    Store { store: String, reason: String },
}

/// Reasons a configuration block is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Zero or several of {local, s3, gcs, azure, swift} are set
    #[error("exactly one storage backend must be set, found {count}")]
    MultipleOrNoBackend { count: usize },

    /// A GroupResources entry lists resource names without resources
    #[error("rule {rule}: group '{group}' sets resourceNames without resources")]
    ResourceNamesWithoutResources { rule: usize, group: String },

    /// Janitor kind has no matching backend block, or carries a foreign one
    #[error("janitor of kind '{kind}' must set exactly the matching backend block")]
    JanitorBackendMismatch { kind: String },

    /// Janitor kind is neither Elasticsearch nor InfluxDB
    #[error("unknown janitor kind '{0}'")]
    UnknownJanitorKind(String),

    /// A credential key required by the active backend is absent
    #[error("{backend} backend requires credential '{key}'")]
    MissingCredential { backend: &'static str, key: &'static str },

    /// A required string field is empty
    #[error("field '{field}' must not be empty")]
    EmptyField { field: &'static str },
}

/// Result type alias for kubed-core operations
pub type Result<T> = std::result::Result<T, KubedError>;
