//! Core task lifecycle types.
//!
//! This module defines the types that appear on the wire and in the result
//! store: [`TaskStatus`], [`ResultRecord`], [`QueueMessage`], and the
//! schedule/status endpoint payloads.
//!
//! # Serialization
//!
//! Statuses serialize in SCREAMING_SNAKE_CASE (`"READY"`, `"NOT_STARTED"`).
//! A [`ResultRecord`]'s `results` field serializes as `null` (not omitted)
//! when absent, so stored blobs always carry both keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Task lifecycle status.
///
/// A task progresses through these states:
///
/// ```text
/// SCHEDULED -> PENDING -> READY   (terminal)
///                      -> ERROR   (terminal)
/// ```
///
/// `SCHEDULED` is written at submission time, before any queue delivery.
/// `PENDING` is written when the executor begins processing a delivered
/// message. Re-delivery of the same message re-enters at `PENDING`; this is
/// safe because every transition fully overwrites the stored record.
///
/// `NOT_STARTED` is derived, never persisted: it is what a status query
/// reports when no record exists for the queried task id.
///
/// # Examples
///
/// ```
/// use taskhub::types::TaskStatus;
///
/// assert!(TaskStatus::Ready.is_terminal());
/// assert!(TaskStatus::Error.is_terminal());
/// assert!(!TaskStatus::Pending.is_terminal());
/// assert!(!TaskStatus::NotStarted.is_persisted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// No record exists for this task id (derived, never stored).
    NotStarted,
    /// A queue message was enqueued; execution has not begun.
    Scheduled,
    /// The executor is processing the task.
    Pending,
    /// Execution finished successfully (terminal).
    Ready,
    /// Execution failed (terminal).
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Pending => write!(f, "PENDING"),
            Self::Ready => write!(f, "READY"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl TaskStatus {
    /// Returns `true` if this status is terminal: no further transition is
    /// expected without a new submission.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Returns `true` if this status may appear in a stored record.
    /// `NOT_STARTED` is reported, never written.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, Self::NotStarted)
    }
}

/// The full record stored (gzip-compressed) per task id.
///
/// Owned exclusively by the executor (and the submission path's initial
/// `SCHEDULED` placeholder); read by any status query. Every write replaces
/// the whole record, which is what makes duplicate queue delivery safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Result payload once `READY`; `null` otherwise.
    pub results: Option<Value>,
}

impl ResultRecord {
    /// The placeholder written at submission time.
    pub fn scheduled() -> Self {
        Self {
            status: TaskStatus::Scheduled,
            results: None,
        }
    }

    /// The record written when the executor picks up a message.
    pub fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            results: None,
        }
    }

    /// The terminal success record.
    pub fn ready(results: Value) -> Self {
        Self {
            status: TaskStatus::Ready,
            results: Some(results),
        }
    }

    /// The terminal failure record (results stay `null`).
    pub fn error() -> Self {
        Self {
            status: TaskStatus::Error,
            results: None,
        }
    }
}

/// The JSON-encoded payload carried by the durable queue.
///
/// Delivered at least once; may be redelivered. Handled idempotently because
/// re-running a task overwrites its own [`ResultRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    /// Content-address of the task descriptor.
    pub task_id: String,
    /// Registry name of the handler to invoke.
    pub task_name: String,
    /// Opaque handler parameters.
    pub task_params: Value,
}

/// Body of `POST /tasks/schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    /// Registry name of the handler to invoke.
    pub task_name: String,
    /// Handler parameters; part of the task's content address.
    pub task_params: Value,
    /// When `true`, bypass the result cache and always enqueue.
    #[serde(default)]
    pub task_skip_cache: bool,
}

/// Response of `POST /tasks/schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    /// Content-address of the submitted descriptor.
    pub task_id: String,
    /// Time-limited URL serving the (gzip-encoded) result blob.
    pub task_results_url: String,
}

/// The `meta` object of a status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMeta {
    /// Reported lifecycle status (`NOT_STARTED` when no record exists).
    pub status: TaskStatus,
    /// Result payload, when the record carries one.
    pub results: Option<Value>,
}

/// Response of `GET /tasks/{task_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The queried task id, echoed back.
    pub task_id: String,
    /// Name of the store holding result blobs.
    pub bucket: String,
    /// `true` iff a record exists for the task id.
    pub processed: bool,
    /// Status and results, or the `NOT_STARTED` placeholder.
    pub meta: StatusMeta,
}

impl From<ResultRecord> for StatusMeta {
    fn from(record: ResultRecord) -> Self {
        Self {
            status: record.status,
            results: record.results,
        }
    }
}

impl StatusMeta {
    /// The placeholder reported when no record exists or a read fails.
    pub fn not_started() -> Self {
        Self {
            status: TaskStatus::NotStarted,
            results: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_wire_casing_is_screaming_snake() {
        assert_eq!(
            serde_json::to_value(TaskStatus::NotStarted).unwrap(),
            json!("NOT_STARTED")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Ready).unwrap(),
            json!("READY")
        );
    }

    #[test]
    fn record_serializes_null_results() {
        let blob = serde_json::to_string(&ResultRecord::scheduled()).unwrap();
        assert_eq!(blob, r#"{"status":"SCHEDULED","results":null}"#);
    }

    #[test]
    fn queue_message_round_trips() {
        let msg = QueueMessage {
            task_id: "abc".into(),
            task_name: "flight_preselection".into(),
            task_params: json!({"x": 1}),
        };
        let decoded: QueueMessage =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn skip_cache_defaults_to_false() {
        let req: ScheduleRequest =
            serde_json::from_value(json!({"task_name": "t", "task_params": {}})).unwrap();
        assert!(!req.task_skip_cache);
    }
}
