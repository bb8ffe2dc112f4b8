//! In-memory store and queue backends.
//!
//! [`MemoryStore`] keeps compressed record blobs in a `DashMap` together
//! with their last-modified timestamps, so the garbage collector behaves
//! identically against it and against S3. [`MemoryQueue`] is a FIFO behind
//! a mutex. Both are the default backends for local mode and the test
//! suite; neither contains task semantics.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;

use super::codec::{decode_record, encode_record};
use super::{results_key, JobQueue, ObjectMeta, ObjectPage, ResultStore, StoreError};
use crate::constants::{megabytes, DELETE_BATCH_MAX};
use crate::identity::TaskId;
use crate::types::{QueueMessage, ResultRecord};

/// Page size of the in-memory listing, mirroring the S3 default.
const LIST_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Thread-safe in-memory result store.
///
/// # Examples
///
/// ```
/// use taskhub::store::memory::MemoryStore;
/// use taskhub::store::ResultStore;
///
/// let store = MemoryStore::new("results-local");
/// assert!(store.is_empty());
/// assert_eq!(store.bucket(), "results-local");
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: DashMap<String, StoredObject>,
}

impl MemoryStore {
    /// Creates an empty store reporting the given bucket name.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: DashMap::new(),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` when no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn exists(&self, id: &TaskId) -> Result<bool, StoreError> {
        Ok(self.objects.contains_key(&results_key(id)))
    }

    async fn get(&self, id: &TaskId) -> Result<Option<ResultRecord>, StoreError> {
        match self.objects.get(&results_key(id)) {
            Some(entry) => decode_record(&entry.bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn put(&self, id: &TaskId, record: &ResultRecord) -> Result<(), StoreError> {
        let encoded = encode_record(record)?;
        info!(
            bucket = %self.bucket,
            key = %results_key(id),
            json_mb = megabytes(encoded.json_len),
            gzip_mb = megabytes(encoded.bytes.len()),
            "stored result record"
        );
        self.objects.insert(
            results_key(id),
            StoredObject {
                bytes: encoded.bytes,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn presigned_url(
        &self,
        id: &TaskId,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        // No credentials to sign with; the shape mirrors a real presigned
        // URL closely enough for clients and tests.
        Ok(format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            results_key(id),
            expires_in.as_secs()
        ))
    }

    async fn list(&self, cursor: Option<String>) -> Result<ObjectPage, StoreError> {
        let offset = match cursor {
            Some(raw) => raw.parse::<usize>().map_err(|_| StoreError::Backend {
                message: format!("invalid listing cursor: {raw:?}"),
                source: None,
            })?,
            None => 0,
        };

        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort_unstable();

        let objects: Vec<ObjectMeta> = keys
            .iter()
            .skip(offset)
            .take(LIST_PAGE_SIZE)
            .filter_map(|key| {
                self.objects.get(key).map(|entry| ObjectMeta {
                    key: key.clone(),
                    last_modified: entry.last_modified,
                })
            })
            .collect();

        let next_cursor =
            (offset + objects.len() < keys.len()).then(|| (offset + LIST_PAGE_SIZE).to_string());
        Ok(ObjectPage {
            objects,
            next_cursor,
        })
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<usize, StoreError> {
        if keys.len() > DELETE_BATCH_MAX {
            return Err(StoreError::BatchTooLarge {
                len: keys.len(),
                max: DELETE_BATCH_MAX,
            });
        }
        let mut deleted = 0;
        for key in keys {
            if self.objects.remove(key).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

/// In-process FIFO job queue.
///
/// # Examples
///
/// ```
/// use taskhub::store::memory::MemoryQueue;
///
/// let queue = MemoryQueue::new();
/// assert_eq!(queue.len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryQueue {
    messages: Mutex<VecDeque<QueueMessage>>,
}

impl MemoryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of undelivered messages.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Returns `true` when no messages are waiting.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, message: &QueueMessage) -> Result<(), StoreError> {
        self.messages.lock().push_back(message.clone());
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, StoreError> {
        let mut queue = self.messages.lock();
        let take = max.min(queue.len());
        Ok(queue.drain(..take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::task_id;
    use serde_json::json;

    #[tokio::test]
    async fn get_of_absent_record_is_none() {
        let store = MemoryStore::new("b");
        let id = task_id("t", &json!({"x": 1}));
        assert!(!store.exists(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::new("b");
        let id = task_id("t", &json!({"x": 1}));
        let record = ResultRecord::ready(json!([1, 2, 3]));
        store.put(&id, &record).await.unwrap();
        assert!(store.exists(&id).await.unwrap());
        assert_eq!(store.get(&id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn oversized_delete_batch_is_rejected() {
        let store = MemoryStore::new("b");
        let keys: Vec<String> = (0..=DELETE_BATCH_MAX).map(|i| i.to_string()).collect();
        assert!(matches!(
            store.delete_batch(&keys).await,
            Err(StoreError::BatchTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn queue_is_fifo_and_bounded_by_max() {
        let queue = MemoryQueue::new();
        for i in 0..3 {
            queue
                .enqueue(&QueueMessage {
                    task_id: i.to_string(),
                    task_name: "t".into(),
                    task_params: json!({}),
                })
                .await
                .unwrap();
        }
        let first = queue.receive(2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].task_id, "0");
        assert_eq!(queue.receive(10).await.unwrap().len(), 1);
        assert!(queue.receive(10).await.unwrap().is_empty());
    }
}
