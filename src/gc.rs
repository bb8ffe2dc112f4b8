//! TTL-based garbage collection of stored results.
//!
//! A sweep enumerates the store's paginated key listing, computes each
//! object's age from its last-modified timestamp, and deletes everything at
//! or past the configured TTL in bounded batches. Sweeps are scheduled
//! non-overlapping, hold no locks, and perform only idempotent deletes, so
//! re-running one is always safe.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::constants::DELETE_BATCH_MAX;
use crate::error::HubError;
use crate::store::ResultStore;

/// Totals of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Keys enumerated.
    pub scanned: usize,
    /// Keys deleted.
    pub deleted: usize,
}

/// Periodic result-store sweeper.
pub struct Sweeper {
    store: Arc<dyn ResultStore>,
    ttl: Duration,
}

impl Sweeper {
    /// Creates a sweeper deleting objects older than `ttl`.
    pub fn new(store: Arc<dyn ResultStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Runs one sweep against the wall clock.
    pub async fn run(&self) -> Result<SweepReport, HubError> {
        self.run_at(Utc::now()).await
    }

    /// Runs one sweep as if the current instant were `now`. This is the
    /// deterministic entry point the tests drive.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepReport, HubError> {
        let ttl_secs = self.ttl.as_secs() as i64;
        let mut scanned = 0;
        let mut expired = Vec::new();

        let mut cursor = None;
        loop {
            let page = self.store.list(cursor).await?;
            scanned += page.objects.len();
            for object in page.objects {
                let age_secs = (now - object.last_modified).num_seconds();
                if age_secs >= ttl_secs {
                    expired.push(object.key);
                }
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(total = scanned, deleting = expired.len(), "sweep scan finished");

        let mut deleted = 0;
        for chunk in expired.chunks(DELETE_BATCH_MAX) {
            deleted += self.store.delete_batch(chunk).await?;
            info!(deleted_keys = chunk.len(), "deleted expired results");
        }

        Ok(SweepReport { scanned, deleted })
    }
}
