//! Wire and domain types.
//!
//! - [`task`] - task lifecycle status, result records, queue messages, and
//!   the schedule/status endpoint payloads.
//! - [`flight`] - typed flight-search parameters and the offer shapes
//!   returned by the external search API.

pub mod flight;
pub mod task;

pub use flight::{FlightOffer, FlightSearchParams, PassengerMix, SearchRequest};
pub use task::{
    QueueMessage, ResultRecord, ScheduleRequest, ScheduleResponse, StatusMeta, StatusResponse,
    TaskStatus,
};
