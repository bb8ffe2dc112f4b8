//! Submission and status-query application service.
//!
//! The HTTP layer delegates here; tests drive this directly. Both paths
//! are stateless and safely callable concurrently — the store's per-key
//! write is the only serialization point, and last-writer-wins is
//! acceptable because the status lifecycle is monotonic.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::HubError;
use crate::identity::{task_id, TaskId};
use crate::store::{JobQueue, ResultStore};
use crate::types::{
    QueueMessage, ResultRecord, ScheduleRequest, ScheduleResponse, StatusMeta, StatusResponse,
};

/// Schedules tasks and answers status queries.
pub struct TaskService {
    store: Arc<dyn ResultStore>,
    queue: Arc<dyn JobQueue>,
    results_expire: Duration,
}

impl TaskService {
    /// Creates a service over injected store and queue adapters.
    pub fn new(
        store: Arc<dyn ResultStore>,
        queue: Arc<dyn JobQueue>,
        results_expire: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            results_expire,
        }
    }

    /// The underlying result store.
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Submits a task.
    ///
    /// Derives the descriptor's content-address; when a record already
    /// exists (and the caller did not opt out of the cache) no new queue
    /// message is enqueued and the existing artifact's presigned URL is
    /// returned. Otherwise a `SCHEDULED` placeholder is written before the
    /// message is enqueued, so a status query can never observe a queued
    /// task without a record.
    pub async fn schedule(&self, request: ScheduleRequest) -> Result<ScheduleResponse, HubError> {
        let id = task_id(&request.task_name, &request.task_params);

        let use_cache = !request.task_skip_cache && self.store.exists(&id).await?;
        if use_cache {
            let task_results_url = self.store.presigned_url(&id, self.results_expire).await?;
            info!(task_name = %request.task_name, task_id = %id, "served task results from cache");
            return Ok(ScheduleResponse {
                task_id: id.to_string(),
                task_results_url,
            });
        }

        self.store.put(&id, &ResultRecord::scheduled()).await?;
        self.queue
            .enqueue(&QueueMessage {
                task_id: id.to_string(),
                task_name: request.task_name.clone(),
                task_params: request.task_params.clone(),
            })
            .await
            .map_err(|e| HubError::Queue(e.to_string()))?;
        let task_results_url = self.store.presigned_url(&id, self.results_expire).await?;
        info!(task_name = %request.task_name, task_id = %id, "scheduled task");
        Ok(ScheduleResponse {
            task_id: id.to_string(),
            task_results_url,
        })
    }

    /// Answers a status query.
    ///
    /// A missing record and a failed store read both degrade to the
    /// `NOT_STARTED` placeholder; a read failure is logged but never
    /// surfaced to the caller as an error.
    pub async fn status(&self, raw_id: &str) -> StatusResponse {
        let record = match TaskId::parse(raw_id) {
            Some(id) => match self.store.get(&id).await {
                Ok(record) => record,
                Err(err) => {
                    warn!(task_id = raw_id, %err, "status read failed; reporting not started");
                    None
                }
            },
            None => None,
        };

        let processed = record.is_some();
        StatusResponse {
            task_id: raw_id.to_string(),
            bucket: self.store.bucket().to_string(),
            processed,
            meta: record.map(StatusMeta::from).unwrap_or_else(StatusMeta::not_started),
        }
    }
}
