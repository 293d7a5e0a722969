//! TTL clock shared by the snapshotter, recycle bin, and log janitors
//!
//! An artifact is expired once its age reaches the configured TTL. A zero
//! TTL means the artifact never expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Returns true iff `now - created_at >= ttl`, with `ttl == 0` never expiring
///
/// Artifacts created after `now` (clock skew) are never expired. A TTL too
/// large to represent as a calendar span never elapses either.
pub fn is_expired(created_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    if ttl.is_zero() {
        return false;
    }

    let ttl = match chrono::Duration::from_std(ttl) {
        Ok(ttl) => ttl,
        Err(_) => return false,
    };

    now.signed_duration_since(created_at) >= ttl
}

/// Configured time-to-live, written as a duration string (`"720h"`, `"30m"`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TtlSpec {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl TtlSpec {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// A TTL that never expires anything
    pub fn immortal() -> Self {
        Self::default()
    }

    pub fn is_immortal(&self) -> bool {
        self.duration.is_zero()
    }

    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        is_expired(created_at, self.duration, now)
    }
}

impl From<Duration> for TtlSpec {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}
