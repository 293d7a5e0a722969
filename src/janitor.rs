//! Periodic sweeps over retained artifacts
//!
//! A `Sweeper` pairs one `ArtifactStore` with one TTL. Each sweep lists
//! the store, classifies the snapshot with the TTL clock, and deletes
//! every expired id once. Two sweepers must not share a store without
//! outside coordination.

use crate::error::Result;
use crate::provider::ArtifactStore;
use crate::retention::expired_ids;
use crate::ttl::TtlSpec;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Artifacts listed
    pub scanned: usize,
    /// Artifacts past the TTL
    pub expired: usize,
    /// Ids deleted successfully
    pub deleted: Vec<String>,
    /// Ids whose deletion failed
    pub failed: Vec<String>,
}

pub struct Sweeper {
    store: Arc<dyn ArtifactStore>,
    ttl: TtlSpec,
}

impl Sweeper {
    pub fn new(store: impl ArtifactStore + 'static, ttl: TtlSpec) -> Self {
        Self {
            store: Arc::new(store),
            ttl,
        }
    }

    /// Share a store that is also used elsewhere
    pub fn with_shared(store: Arc<dyn ArtifactStore>, ttl: TtlSpec) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> TtlSpec {
        self.ttl
    }

    /// Run one sweep against `now`
    ///
    /// Listing errors abort the sweep; delete errors are recorded in the
    /// report and the sweep continues.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let artifacts = self.store.list().await?;
        let expired: Vec<String> = expired_ids(self.ttl, &artifacts, now)
            .map(str::to_string)
            .collect();

        let mut report = SweepReport {
            scanned: artifacts.len(),
            expired: expired.len(),
            ..Default::default()
        };

        for id in expired {
            match self.store.delete(&id).await {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    tracing::warn!(
                        store = %self.store.name(),
                        artifact = %id,
                        error = %e,
                        "Failed to delete expired artifact"
                    );
                    report.failed.push(id);
                }
            }
        }

        tracing::info!(
            store = %self.store.name(),
            scanned = report.scanned,
            expired = report.expired,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Sweep completed"
        );

        Ok(report)
    }

    /// Sweep every `period` until `shutdown` turns true or its sender drops
    ///
    /// A zero TTL or a zero period disables the sweeper.
    pub async fn run(&self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        if self.ttl.is_immortal() {
            tracing::info!(store = %self.store.name(), "TTL is zero, sweeper disabled");
            return;
        }
        if period.is_zero() {
            tracing::warn!(store = %self.store.name(), "Sweep period is zero, sweeper disabled");
            return;
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(Utc::now()).await {
                        tracing::warn!(
                            store = %self.store.name(),
                            error = %e,
                            "Sweep failed"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!(store = %self.store.name(), "Sweeper stopped");
                        return;
                    }
                }
            }
        }
    }
}
