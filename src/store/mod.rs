//! Result store and job queue adapters.
//!
//! # Architecture
//!
//! All I/O side effects of the hub are confined to this module. Two traits
//! form the boundary:
//!
//! 1. **[`ResultStore`]** — get/put/exists/presigned-url/list/delete-batch
//!    against a compressed blob store, one blob per task id. Absence of a
//!    record is an explicit `Ok(None)` / `Ok(false)` outcome, never an
//!    error; [`StoreError`] is reserved for genuinely unexpected failures.
//!
//! 2. **[`JobQueue`]** — enqueue/receive against a durable queue delivering
//!    [`QueueMessage`]s at least once. `receive` adapts the backend's
//!    delivery envelope into the canonical message shape.
//!
//! # Backends
//!
//! - [`memory`] — `DashMap`-backed store and in-process queue; the default
//!   backend for local mode and tests.
//! - [`s3`] / [`sqs`] — Amazon S3 blob store and SQS queue, behind the
//!   `aws` feature flag.
//!
//! Backends are dumb adapters: key derivation and the gzip JSON record
//! codec ([`codec`]) are shared, and no backend interprets task semantics.

pub mod codec;
pub mod memory;
#[cfg(feature = "aws")]
pub mod s3;
#[cfg(feature = "aws")]
pub mod sqs;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::constants::RESULTS_KEY_SUFFIX;
use crate::identity::TaskId;
use crate::types::{QueueMessage, ResultRecord};

/// Errors surfaced by store and queue backends.
///
/// Missing records are **not** errors; adapters translate their backend's
/// "no such key" signal into `Ok(None)`. Everything here is unexpected.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O or backend-specific failure (network, throttling, permission).
    #[error("backend error: {message}")]
    Backend {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A blob failed to compress, decompress, or (de)serialize.
    #[error("record codec error: {0}")]
    Codec(String),

    /// A `delete_batch` call exceeded the per-call bound.
    #[error("delete batch of {len} keys exceeds the {max}-key bound")]
    BatchTooLarge {
        /// Keys in the rejected call.
        len: usize,
        /// The per-call bound.
        max: usize,
    },
}

impl StoreError {
    /// Builds a [`StoreError::Backend`] from any error value.
    pub fn backend(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// The object key holding a task's result blob.
pub fn results_key(id: &TaskId) -> String {
    format!("{id}{RESULTS_KEY_SUFFIX}")
}

/// Metadata of one stored object, as returned by [`ResultStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Full object key (task id plus suffix).
    pub key: String,
    /// Last-modified timestamp the backend reports.
    pub last_modified: DateTime<Utc>,
}

/// One page of a store listing.
///
/// Enumeration restarts from the beginning only; cursors are opaque and
/// never persisted across sweeps.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects on this page.
    pub objects: Vec<ObjectMeta>,
    /// Cursor for the next page, absent on the last page.
    pub next_cursor: Option<String>,
}

/// Compressed blob store holding one [`ResultRecord`] per task id.
///
/// Implementations must be `Send + Sync`; the submission path, status
/// queries, the executor, and the garbage collector all share one instance
/// through `Arc<dyn ResultStore>`.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Name of the underlying bucket or store, echoed in status responses.
    fn bucket(&self) -> &str;

    /// Returns `true` iff a record is present, regardless of status.
    async fn exists(&self, id: &TaskId) -> Result<bool, StoreError>;

    /// Returns the decompressed, decoded record, or `None` when absent.
    async fn get(&self, id: &TaskId) -> Result<Option<ResultRecord>, StoreError>;

    /// Overwrites the full record in a single blob write.
    ///
    /// Implementations log the payload size before and after compression.
    async fn put(&self, id: &TaskId, record: &ResultRecord) -> Result<(), StoreError>;

    /// Produces a time-limited, credential-free read URL for the record's
    /// compressed bytes. The artifact stays gzip-encoded over this URL.
    async fn presigned_url(&self, id: &TaskId, expires_in: Duration)
        -> Result<String, StoreError>;

    /// Returns one page of the full key listing, restartable from the start
    /// by passing `None`.
    async fn list(&self, cursor: Option<String>) -> Result<ObjectPage, StoreError>;

    /// Deletes up to [`DELETE_BATCH_MAX`](crate::constants::DELETE_BATCH_MAX)
    /// keys and returns how many the backend acknowledged. Deleting an
    /// absent key is a no-op, not an error.
    async fn delete_batch(&self, keys: &[String]) -> Result<usize, StoreError>;
}

/// Durable queue carrying [`QueueMessage`]s with at-least-once delivery.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Appends one message.
    async fn enqueue(&self, message: &QueueMessage) -> Result<(), StoreError>;

    /// Fetches up to `max` deliveries and adapts each envelope into the
    /// canonical message shape. Returns an empty vec when idle.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, StoreError>;
}
