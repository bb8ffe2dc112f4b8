//! Asynchronous task-execution hub.
//!
//! Clients submit a named task with parameters; the hub deduplicates
//! identical submissions through a content-addressed task identity,
//! executes unseen tasks through a durable queue, and stores
//! gzip-compressed JSON results in a blob store with a time-to-live.
//!
//! # Overview
//!
//! A submission derives a [`TaskId`](identity::TaskId) from the canonical
//! descriptor. If the result store already holds a record for that id, the
//! cached artifact's presigned URL is returned directly; otherwise a
//! `SCHEDULED` placeholder is written and a queue message enqueued. The
//! [`executor`] drives delivered messages through
//! `SCHEDULED -> PENDING -> READY | ERROR`, dispatching by task name
//! through a startup-built registry. The flight-preselection handler
//! expands its parameter ranges into many concurrent search requests under
//! a dual concurrency/rate limiter and winnows the results to a bounded
//! competitive subset. The [`gc`] sweeper independently deletes result
//! blobs older than the configured TTL.
//!
//! # Module Organization
//!
//! - [`identity`] - content-addressed task identity
//! - [`types`] - lifecycle, wire, and flight-domain types
//! - [`store`] - result store and job queue adapters (memory default,
//!   S3/SQS behind the `aws` feature)
//! - [`executor`] - queue-driven state machine and handler registry
//! - [`tasks`] - built-in task handlers (flight preselection: fan-out,
//!   filter, duration parsing, search-API client)
//! - [`gc`] - TTL sweeper over the result store
//! - [`service`] - submission/status application service
//! - [`server`] - axum HTTP surface
//! - [`config`] - environment-driven settings

pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod gc;
pub mod identity;
pub mod server;
pub mod service;
pub mod store;
pub mod tasks;
pub mod types;

pub use config::Settings;
pub use error::{HubError, Result};
pub use identity::{task_id, TaskId};
pub use service::TaskService;
pub use types::{QueueMessage, ResultRecord, TaskStatus};
