//! Submission → execution → status lifecycle against the memory backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use taskhub::executor::registry::{HandlerRegistry, TaskHandler};
use taskhub::executor::Executor;
use taskhub::identity::TaskId;
use taskhub::service::TaskService;
use taskhub::store::memory::{MemoryQueue, MemoryStore};
use taskhub::store::JobQueue;
use taskhub::store::ResultStore;
use taskhub::types::{ScheduleRequest, TaskStatus};
use taskhub::HubError;

struct CountingHandler;

#[async_trait]
impl TaskHandler for CountingHandler {
    async fn run(&self, _id: &TaskId, _params: Value) -> Result<Value, HubError> {
        Ok(json!([1, 2, 3]))
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    queue: Arc<MemoryQueue>,
    service: TaskService,
    executor: Executor,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new("task-hub-results-test"));
    let queue = Arc::new(MemoryQueue::new());
    let service = TaskService::new(store.clone(), queue.clone(), Duration::from_secs(86_400));
    let mut registry = HandlerRegistry::new();
    registry.register("t", Arc::new(CountingHandler)).unwrap();
    let executor = Executor::new(store.clone(), Arc::new(registry));
    Fixture {
        store,
        queue,
        service,
        executor,
    }
}

#[tokio::test]
async fn full_lifecycle_from_submission_to_ready() {
    let fx = fixture();

    // Submit.
    let response = fx
        .service
        .schedule(ScheduleRequest {
            task_name: "t".into(),
            task_params: json!({"x": 1}),
            task_skip_cache: false,
        })
        .await
        .unwrap();
    assert_eq!(response.task_id.len(), 32);
    assert!(response
        .task_id
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));

    // Before the worker runs the record is the SCHEDULED placeholder.
    let status = fx.service.status(&response.task_id).await;
    assert!(status.processed);
    assert_eq!(status.meta.status, TaskStatus::Scheduled);
    assert_eq!(status.meta.results, None);

    // Worker pass.
    let batch = fx.queue.receive(10).await.unwrap();
    assert_eq!(batch.len(), 1);
    fx.executor.process_batch(batch).await.unwrap();

    // Terminal status with results.
    let status = fx.service.status(&response.task_id).await;
    assert!(status.processed);
    assert_eq!(status.meta.status, TaskStatus::Ready);
    assert_eq!(status.meta.results, Some(json!([1, 2, 3])));
    assert_eq!(status.bucket, "task-hub-results-test");
}

#[tokio::test]
async fn terminal_result_is_served_from_cache() {
    let fx = fixture();
    let request = ScheduleRequest {
        task_name: "t".into(),
        task_params: json!({"x": 1}),
        task_skip_cache: false,
    };

    let first = fx.service.schedule(request.clone()).await.unwrap();
    let batch = fx.queue.receive(10).await.unwrap();
    fx.executor.process_batch(batch).await.unwrap();

    // Resubmission: no new message, same URL, record untouched.
    let second = fx.service.schedule(request).await.unwrap();
    assert!(fx.queue.is_empty());
    assert_eq!(first.task_results_url, second.task_results_url);

    let id = TaskId::parse(&first.task_id).unwrap();
    let record = fx.store.get(&id).await.unwrap().unwrap();
    assert_eq!(record.status, TaskStatus::Ready);
}

#[tokio::test]
async fn skip_cache_reschedules_over_a_terminal_result() {
    let fx = fixture();
    let mut request = ScheduleRequest {
        task_name: "t".into(),
        task_params: json!({"x": 1}),
        task_skip_cache: false,
    };

    fx.service.schedule(request.clone()).await.unwrap();
    fx.executor
        .process_batch(fx.queue.receive(10).await.unwrap())
        .await
        .unwrap();

    request.task_skip_cache = true;
    let response = fx.service.schedule(request).await.unwrap();

    // A fresh message was enqueued and the record reset to SCHEDULED.
    assert_eq!(fx.queue.len(), 1);
    let status = fx.service.status(&response.task_id).await;
    assert_eq!(status.meta.status, TaskStatus::Scheduled);
}

#[tokio::test]
async fn status_of_never_submitted_task_is_not_started() {
    let fx = fixture();
    let status = fx.service.status(&"f".repeat(32)).await;
    assert!(!status.processed);
    assert_eq!(status.meta.status, TaskStatus::NotStarted);
    assert_eq!(status.meta.results, None);
}
