//! In-memory collaborators for development and testing

use super::{ArtifactStore, Notifier};
use crate::error::{KubedError, Result};
use crate::types::{Receiver, ResourceEvent, RetainedArtifact};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A delivery recorded by `MemoryNotifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub receiver: Receiver,
    pub event: ResourceEvent,
}

/// Notifier that records deliveries instead of sending them
///
/// Destinations listed with `fail_for` are rejected, which lets tests
/// exercise partial delivery failures.
#[derive(Clone)]
pub struct MemoryNotifier {
    name: String,
    deliveries: Arc<RwLock<Vec<Delivery>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MemoryNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deliveries: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make deliveries to `destination` fail
    pub async fn fail_for(&self, destination: impl Into<String>) {
        self.failing.write().await.insert(destination.into());
    }

    /// Deliveries recorded so far, oldest first
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.read().await.clone()
    }
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, receiver: &Receiver, event: &ResourceEvent) -> Result<()> {
        {
            let failing = self.failing.read().await;
            if let Some(to) = receiver.to.iter().find(|to| failing.contains(*to)) {
                return Err(KubedError::Notifier {
                    notifier: self.name.clone(),
                    reason: format!("destination '{}' rejected", to),
                });
            }
        }

        self.deliveries.write().await.push(Delivery {
            receiver: receiver.clone(),
            event: event.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Artifact store backed by a `Vec`
#[derive(Clone)]
pub struct MemoryArtifactStore {
    name: String,
    artifacts: Arc<RwLock<Vec<RetainedArtifact>>>,
    undeletable: Arc<RwLock<HashSet<String>>>,
}

impl MemoryArtifactStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifacts: Arc::new(RwLock::new(Vec::new())),
            undeletable: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Create a store pre-populated with `artifacts`
    pub fn with_artifacts(name: impl Into<String>, artifacts: Vec<RetainedArtifact>) -> Self {
        Self {
            name: name.into(),
            artifacts: Arc::new(RwLock::new(artifacts)),
            undeletable: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub async fn insert(&self, artifact: RetainedArtifact) {
        self.artifacts.write().await.push(artifact);
    }

    /// Make deletes of `id` fail
    pub async fn protect(&self, id: impl Into<String>) {
        self.undeletable.write().await.insert(id.into());
    }

    /// Ids currently held, in insertion order
    pub async fn ids(&self) -> Vec<String> {
        self.artifacts
            .read()
            .await
            .iter()
            .map(|a| a.id.clone())
            .collect()
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn list(&self) -> Result<Vec<RetainedArtifact>> {
        Ok(self.artifacts.read().await.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if self.undeletable.read().await.contains(id) {
            return Err(KubedError::Store {
                store: self.name.clone(),
                reason: format!("artifact '{}' is protected", id),
            });
        }

        let mut artifacts = self.artifacts.write().await;
        let before = artifacts.len();
        artifacts.retain(|a| a.id != id);

        if artifacts.len() == before {
            return Err(KubedError::Store {
                store: self.name.clone(),
                reason: format!("artifact '{}' not found", id),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
