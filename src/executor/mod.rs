//! Queue-driven executor state machine.
//!
//! Drives a task from delivered queue message to terminal status:
//!
//! ```text
//! SCHEDULED -(delivery)-> PENDING -> READY | ERROR
//! ```
//!
//! Each transition fully overwrites the task's stored record, which makes
//! duplicate delivery and concurrent horizontal instances safe — the worst
//! case is redundant work, never a corrupted record. A handler failure is
//! caught per message (elapsed time and parameters logged, terminal
//! `ERROR` written) and never aborts the rest of the delivery batch; an
//! unknown task name, by contrast, is a configuration fault that aborts
//! loudly.

pub mod registry;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::constants::{megabytes, RECEIVE_BATCH_MAX};
use crate::error::HubError;
use crate::identity::TaskId;
use crate::store::{JobQueue, ResultStore};
use crate::types::{QueueMessage, ResultRecord};
use registry::HandlerRegistry;

/// Elapsed seconds since `started`, rounded to two decimals for logging.
fn elapsed_secs(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}

/// Executes delivered queue messages against the handler registry.
pub struct Executor {
    store: Arc<dyn ResultStore>,
    registry: Arc<HandlerRegistry>,
}

impl Executor {
    /// Creates an executor over a store and a startup-built registry.
    pub fn new(store: Arc<dyn ResultStore>, registry: Arc<HandlerRegistry>) -> Self {
        Self { store, registry }
    }

    /// Processes one delivery batch, message by message.
    ///
    /// # Errors
    ///
    /// Only configuration faults ([`HubError::UnknownTask`]) propagate;
    /// per-task handler failures are recorded as terminal `ERROR` statuses
    /// and do not interrupt the batch.
    pub async fn process_batch(&self, messages: Vec<QueueMessage>) -> Result<(), HubError> {
        for message in messages {
            self.process_one(message).await?;
        }
        Ok(())
    }

    async fn process_one(&self, message: QueueMessage) -> Result<(), HubError> {
        let QueueMessage {
            task_id,
            task_name,
            task_params,
        } = message;
        let id = TaskId::parse(&task_id).ok_or_else(|| {
            HubError::InvalidParams(format!("malformed task id in queue message: {task_id:?}"))
        })?;

        let started = Instant::now();
        info!(task_id = %id, %task_name, params = %task_params, "job started");
        self.store.put(&id, &ResultRecord::pending()).await?;

        // Registry misses abort the batch: this is a deployment fault, not
        // a property of the task.
        let handler = self.registry.dispatch(&task_name)?;

        match handler.run(&id, task_params.clone()).await {
            Ok(results) => {
                let size_mb = serde_json::to_vec(&results)
                    .map(|bytes| megabytes(bytes.len()))
                    .unwrap_or(0.0);
                info!(
                    task_id = %id,
                    %task_name,
                    elapsed_s = elapsed_secs(started),
                    size_mb,
                    "job successful"
                );
                self.store.put(&id, &ResultRecord::ready(results)).await?;
            }
            Err(err) => {
                error!(
                    task_id = %id,
                    %task_name,
                    params = %task_params,
                    elapsed_s = elapsed_secs(started),
                    %err,
                    "job failed"
                );
                self.store.put(&id, &ResultRecord::error()).await?;
            }
        }
        Ok(())
    }

    /// Polls the queue forever, processing one batch at a time.
    ///
    /// Sleeps `poll_interval` between empty polls. Returns only on a
    /// configuration fault or when the queue backend fails.
    pub async fn run_loop(
        &self,
        queue: Arc<dyn JobQueue>,
        poll_interval: Duration,
    ) -> Result<(), HubError> {
        loop {
            let batch = queue
                .receive(RECEIVE_BATCH_MAX)
                .await
                .map_err(|e| HubError::Queue(e.to_string()))?;
            if batch.is_empty() {
                tokio::time::sleep(poll_interval).await;
                continue;
            }
            self.process_batch(batch).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::task_id;
    use crate::store::memory::MemoryStore;
    use crate::types::TaskStatus;
    use async_trait::async_trait;
    use registry::TaskHandler;
    use serde_json::{json, Value};

    struct Doubler;

    #[async_trait]
    impl TaskHandler for Doubler {
        async fn run(&self, _id: &TaskId, params: Value) -> Result<Value, HubError> {
            let x = params["x"].as_i64().unwrap_or(0);
            Ok(json!(x * 2))
        }
    }

    struct Exploder;

    #[async_trait]
    impl TaskHandler for Exploder {
        async fn run(&self, _id: &TaskId, _params: Value) -> Result<Value, HubError> {
            Err(HubError::InvalidParams("boom".into()))
        }
    }

    fn setup() -> (Arc<MemoryStore>, Executor) {
        let store = Arc::new(MemoryStore::new("bucket"));
        let mut registry = HandlerRegistry::new();
        registry.register("double", Arc::new(Doubler)).unwrap();
        registry.register("explode", Arc::new(Exploder)).unwrap();
        let executor = Executor::new(store.clone(), Arc::new(registry));
        (store, executor)
    }

    fn message(name: &str, params: Value) -> QueueMessage {
        QueueMessage {
            task_id: task_id(name, &params).to_string(),
            task_name: name.into(),
            task_params: params,
        }
    }

    #[tokio::test]
    async fn success_writes_ready_with_results() {
        let (store, executor) = setup();
        let msg = message("double", json!({"x": 21}));
        let id = TaskId::parse(&msg.task_id).unwrap();
        executor.process_batch(vec![msg]).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Ready);
        assert_eq!(record.results, Some(json!(42)));
    }

    #[tokio::test]
    async fn handler_failure_writes_error_and_batch_continues() {
        let (store, executor) = setup();
        let failing = message("explode", json!({}));
        let ok = message("double", json!({"x": 1}));
        let failing_id = TaskId::parse(&failing.task_id).unwrap();
        let ok_id = TaskId::parse(&ok.task_id).unwrap();

        executor.process_batch(vec![failing, ok]).await.unwrap();

        let failed = store.get(&failing_id).await.unwrap().unwrap();
        assert_eq!(failed.status, TaskStatus::Error);
        assert_eq!(failed.results, None);
        let succeeded = store.get(&ok_id).await.unwrap().unwrap();
        assert_eq!(succeeded.status, TaskStatus::Ready);
    }

    #[tokio::test]
    async fn unknown_task_name_aborts_the_batch() {
        let (_store, executor) = setup();
        let result = executor.process_batch(vec![message("ghost", json!({}))]).await;
        assert!(matches!(result, Err(HubError::UnknownTask { .. })));
    }

    #[tokio::test]
    async fn redelivery_overwrites_idempotently() {
        let (store, executor) = setup();
        let msg = message("double", json!({"x": 2}));
        let id = TaskId::parse(&msg.task_id).unwrap();
        executor.process_batch(vec![msg.clone()]).await.unwrap();
        executor.process_batch(vec![msg]).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Ready);
        assert_eq!(record.results, Some(json!(4)));
    }
}
