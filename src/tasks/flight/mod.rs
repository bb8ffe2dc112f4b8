//! The flight-preselection task handler.
//!
//! Expands the task's parameter ranges into concrete search requests,
//! executes them through the rate-limited fan-out engine, and winnows the
//! aggregated offers down to a competitive subset. The surviving offers
//! are the task's result payload.

pub mod api;
pub mod duration;
pub mod fanout;
pub mod filter;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use self::api::{SearchApiFactory, SearchOutcome};
use self::fanout::{dispatch_all, expand_requests, FanoutLimits};
use self::filter::filter_offers;
use crate::error::HubError;
use crate::executor::registry::TaskHandler;
use crate::identity::TaskId;
use crate::types::flight::{FlightOffer, FlightSearchParams};

/// Summary statistics of one fan-out run, logged for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutStats {
    /// Search requests dispatched.
    pub total_tasks: usize,
    /// 200 responses.
    pub ok_count: usize,
    /// Non-200 responses (timeouts included, as synthetic 408s).
    pub error_count: usize,
    /// Distinct non-200 status codes observed.
    pub error_codes: Vec<u16>,
    /// Offers aggregated before filtering.
    pub found_count: usize,
    /// Offers surviving the filter.
    pub filtered_count: usize,
}

/// Splits outcomes into aggregated offers and failure bookkeeping.
fn partition_outcomes(outcomes: Vec<SearchOutcome>) -> (Vec<FlightOffer>, usize, usize, Vec<u16>) {
    let mut offers = Vec::new();
    let mut ok_count = 0;
    let mut error_count = 0;
    let mut error_codes = BTreeSet::new();
    for outcome in outcomes {
        if outcome.status == 200 {
            ok_count += 1;
            offers.extend(outcome.offers);
        } else {
            error_count += 1;
            error_codes.insert(outcome.status);
        }
    }
    (offers, ok_count, error_count, error_codes.into_iter().collect())
}

/// Handler for the `flight_preselection` task.
pub struct FlightPreselectionHandler {
    factory: Arc<dyn SearchApiFactory>,
    limits: FanoutLimits,
    token_settle: Duration,
}

impl FlightPreselectionHandler {
    /// Creates a handler. `token_settle` is the delay between token
    /// acquisition and the first dispatched request.
    pub fn new(
        factory: Arc<dyn SearchApiFactory>,
        limits: FanoutLimits,
        token_settle: Duration,
    ) -> Self {
        Self {
            factory,
            limits,
            token_settle,
        }
    }
}

#[async_trait]
impl TaskHandler for FlightPreselectionHandler {
    async fn run(&self, task_id: &TaskId, params: Value) -> Result<Value, HubError> {
        let params: FlightSearchParams =
            serde_json::from_value(params).map_err(|e| HubError::InvalidParams(e.to_string()))?;
        let requests = expand_requests(&params);

        // One token per invocation, reused across the whole fan-out.
        let api = self.factory.make();
        info!(%task_id, requests = requests.len(), "obtaining access token");
        api.acquire_token().await?;
        tokio::time::sleep(self.token_settle).await;
        info!(%task_id, requests = requests.len(), "dispatching search requests");

        let outcomes = dispatch_all(api.as_ref(), &requests, &self.limits).await?;
        let (offers, ok_count, error_count, error_codes) = partition_outcomes(outcomes);
        let found_count = offers.len();

        let filtered = filter_offers(offers)?;
        let stats = FanoutStats {
            total_tasks: requests.len(),
            ok_count,
            error_count,
            error_codes,
            found_count,
            filtered_count: filtered.len(),
        };
        info!(%task_id, ?stats, "fan-out finished");

        Ok(serde_json::to_value(filtered)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status: u16, offers: usize) -> SearchOutcome {
        let offers = (0..offers)
            .map(|i| {
                serde_json::from_value(json!({
                    "price": {"grandTotal": format!("{}.00", 100 + i)},
                    "itineraries": [{"duration": "PT5H", "segments": [{}]}]
                }))
                .unwrap()
            })
            .collect();
        SearchOutcome { status, offers }
    }

    #[test]
    fn partition_aggregates_and_counts() {
        let (offers, ok, err, codes) = partition_outcomes(vec![
            outcome(200, 2),
            outcome(408, 0),
            outcome(200, 3),
            outcome(500, 0),
            outcome(408, 0),
        ]);
        assert_eq!(offers.len(), 5);
        assert_eq!(ok, 2);
        assert_eq!(err, 3);
        assert_eq!(codes, vec![408, 500]);
    }
}
