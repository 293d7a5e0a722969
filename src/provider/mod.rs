//! Collaborator traits for the outer system
//!
//! The decision core never performs I/O. Notification delivery and
//! artifact storage are reached through these traits; real transports
//! (email, chat, webhooks, object stores, log stores) implement them
//! outside this crate.

use crate::error::Result;
use crate::types::{Receiver, ResourceEvent, RetainedArtifact};
use async_trait::async_trait;

pub mod memory;

/// Delivers a forwarded event to one receiver
///
/// Implementations are keyed by `Receiver::notifier`.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `event` to the destinations in `receiver`
    async fn notify(&self, receiver: &Receiver, event: &ResourceEvent) -> Result<()>;

    /// Notifier key (e.g., "mailgun", "slack", "webhook")
    fn name(&self) -> &str;

    /// Health check; returns true if the transport is usable
    ///
    /// Default implementation always reports healthy.
    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

/// A set of retained artifacts that can be listed and deleted
///
/// Backed by a snapshot bucket, recycle bin directory, or log store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Snapshot of the artifacts currently retained
    async fn list(&self) -> Result<Vec<RetainedArtifact>>;

    /// Delete one artifact by id
    async fn delete(&self, id: &str) -> Result<()>;

    /// Store name (e.g., "snapshots", "recycle-bin", "elasticsearch")
    fn name(&self) -> &str;
}
