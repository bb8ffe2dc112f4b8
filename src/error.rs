//! Error types for hub operations.
//!
//! [`HubError`] is the crate-level error enum. Storage backends report the
//! lower-level [`StoreError`](crate::store::StoreError), which is wrapped
//! into [`HubError::Store`] at the component boundary; store *absence* is
//! never an error — adapters return `Ok(None)` for missing records.

use thiserror::Error;

/// Errors that can occur during task scheduling, execution, or sweeping.
///
/// Variants carry enough context (task name, offending input) to diagnose a
/// failure from the logs alone.
#[derive(Debug, Error)]
pub enum HubError {
    /// A storage backend failed in a genuinely unexpected way.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// The durable queue rejected an enqueue or receive call.
    #[error("queue error: {0}")]
    Queue(String),

    /// A record or message failed to encode or decode.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The external search API failed at the transport level (timeouts are
    /// absorbed into the result set instead, as synthetic 408 outcomes).
    #[error("search API error: {0}")]
    SearchApi(#[from] reqwest::Error),

    /// The search API token exchange returned an unusable payload.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Task parameters failed validation for the addressed handler.
    #[error("invalid task params: {0}")]
    InvalidParams(String),

    /// A queue message addressed a task name absent from the registry.
    /// This is a configuration fault, not a recoverable per-task condition.
    #[error("no handler registered for task name: {name}")]
    UnknownTask {
        /// The unrecognized task name.
        name: String,
    },

    /// A task name was registered twice.
    #[error("handler already registered for task name: {name}")]
    DuplicateHandler {
        /// The doubly-registered task name.
        name: String,
    },

    /// An itinerary duration string was not a valid ISO 8601 duration.
    #[error("invalid ISO 8601 duration: {0:?}")]
    InvalidDuration(String),

    /// An offer carried a price that could not be read as a number.
    #[error("invalid offer price: {0:?}")]
    InvalidPrice(String),

    /// The process configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result alias used throughout the crate.
pub type Result<T, E = HubError> = std::result::Result<T, E>;
