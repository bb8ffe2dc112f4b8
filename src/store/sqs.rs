//! Amazon SQS job queue backend.
//!
//! Adapts SQS deliveries into the canonical [`QueueMessage`] shape.
//! Messages are deleted as soon as their body decodes, which gives
//! best-effort single delivery: a crash between decode and completion
//! loses the delivery, and SQS redelivery before the delete duplicates it.
//! Both are tolerated — the executor's writes are idempotent full-record
//! overwrites. Messages with undecodable bodies are deleted too (and
//! logged), so a poison message cannot wedge the queue.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::{error, warn};

use super::{JobQueue, StoreError};
use crate::types::QueueMessage;

/// SQS-backed job queue.
///
/// # Examples
///
/// ```rust,no_run
/// use taskhub::store::sqs::SqsQueue;
///
/// # async fn example() -> Result<(), taskhub::store::StoreError> {
/// let queue = SqsQueue::from_env("task-hub-jobs-prod").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    /// Creates a queue adapter with a pre-built client and resolved URL.
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Creates a queue adapter using the standard AWS SDK config chain,
    /// resolving the queue URL from its name.
    pub async fn from_env(queue_name: &str) -> Result<Self, StoreError> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        let output = client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(|e| {
                StoreError::backend(
                    format!("failed to resolve queue URL for {queue_name}"),
                    e.into_service_error(),
                )
            })?;
        let queue_url = output.queue_url().ok_or_else(|| StoreError::Backend {
            message: format!("queue {queue_name} resolved to an empty URL"),
            source: None,
        })?;
        Ok(Self::new(client, queue_url))
    }
}

#[async_trait]
impl JobQueue for SqsQueue {
    async fn enqueue(&self, message: &QueueMessage) -> Result<(), StoreError> {
        let body =
            serde_json::to_string(message).map_err(|e| StoreError::Codec(e.to_string()))?;
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                StoreError::backend("SQS send_message failed", e.into_service_error())
            })?;
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>, StoreError> {
        // SQS caps a single receive at 10 messages.
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max.min(10) as i32)
            .send()
            .await
            .map_err(|e| {
                StoreError::backend("SQS receive_message failed", e.into_service_error())
            })?;

        let mut messages = Vec::new();
        for delivery in output.messages() {
            match delivery
                .body()
                .map(serde_json::from_str::<QueueMessage>)
                .transpose()
            {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => warn!("SQS delivery had no body; dropping"),
                Err(err) => {
                    error!(%err, message_id = ?delivery.message_id(), "undecodable queue message; dropping");
                }
            }

            if let Some(receipt) = delivery.receipt_handle() {
                if let Err(err) = self
                    .client
                    .delete_message()
                    .queue_url(&self.queue_url)
                    .receipt_handle(receipt)
                    .send()
                    .await
                {
                    warn!(err = %err.into_service_error(), "failed to delete SQS delivery; it will reappear");
                }
            }
        }
        Ok(messages)
    }
}
