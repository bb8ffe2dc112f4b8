//! Search-request expansion and rate-limited concurrent dispatch.
//!
//! One task's parameter ranges expand into the full Cartesian set of
//! concrete [`SearchRequest`]s, which are then dispatched under a dual
//! limiter: at most `max_in_flight` requests running simultaneously AND at
//! most `max_per_second` requests newly started per rolling second. Both
//! constraints are rolling — a completion freeing an in-flight slot does
//! not grant an extra start within the same second.

use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::Days;
use futures::future::join_all;
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;
use tracing::info;

use super::api::{SearchApi, SearchOutcome};
use crate::error::HubError;
use crate::types::flight::{FlightLeg, FlightSearchParams, SearchRequest};

/// The dual limiter's ceilings.
#[derive(Debug, Clone, Copy)]
pub struct FanoutLimits {
    /// Maximum requests in flight simultaneously.
    pub max_in_flight: u32,
    /// Maximum requests newly started per rolling second.
    pub max_per_second: u32,
}

/// Expands a task's parameter ranges into every concrete search request.
///
/// Date pairs are every departure date crossed with every nights value
/// whose implied return date falls inside the return window. Airport
/// tuples are the Cartesian product of the four airport sets; unless
/// `multicity` is set, only true round trips survive (outbound arrival ==
/// return departure, outbound departure == return arrival).
pub fn expand_requests(params: &FlightSearchParams) -> Vec<SearchRequest> {
    let mut date_pairs = Vec::new();
    let mut departure = params.date_from;
    while departure <= params.date_to {
        for nights in params.nights_in_dst_from..=params.nights_in_dst_to {
            if let Some(return_date) = departure.checked_add_days(Days::new(nights.into())) {
                if return_date >= params.return_from && return_date <= params.return_to {
                    date_pairs.push((departure, return_date));
                }
            }
        }
        match departure.succ_opt() {
            Some(next) => departure = next,
            None => break,
        }
    }

    let mut airports = BTreeSet::new();
    for fly_from in &params.fly_from_airports {
        for fly_to in &params.fly_to_airports {
            for return_from in &params.return_from_airports {
                for return_to in &params.return_to_airports {
                    airports.insert((
                        fly_from.clone(),
                        fly_to.clone(),
                        return_from.clone(),
                        return_to.clone(),
                    ));
                }
            }
        }
    }
    if !params.multicity {
        airports.retain(|(fly_from, fly_to, return_from, return_to)| {
            fly_from == return_to && fly_to == return_from
        });
    }

    let requests: Vec<SearchRequest> = date_pairs
        .iter()
        .flat_map(|(departure_date, return_date)| {
            airports.iter().map(move |(fly_from, fly_to, return_from, return_to)| {
                SearchRequest {
                    legs: vec![
                        FlightLeg {
                            origin: fly_from.clone(),
                            destination: fly_to.clone(),
                            departure_date: *departure_date,
                        },
                        FlightLeg {
                            origin: return_from.clone(),
                            destination: return_to.clone(),
                            departure_date: *return_date,
                        },
                    ],
                    passengers: params.passengers_map.clone(),
                    currency_code: params.currency_code.clone(),
                    cabin_class: params.cabin_class,
                }
            })
        })
        .collect();

    info!(
        date_combinations = date_pairs.len(),
        airport_combinations = airports.len(),
        total_combinations = requests.len(),
        multicity = params.multicity,
        allow_opposite_route = params.allow_opposite_route,
        "expanded search requests"
    );
    requests
}

/// Dispatches every request concurrently under the dual limiter and
/// collects all outcomes.
///
/// A request claims an in-flight permit first, then waits for a start-rate
/// token, then runs. Per-request timeouts are already absorbed into the
/// outcome by the client; any other transport failure aborts the fan-out.
pub async fn dispatch_all(
    api: &dyn SearchApi,
    requests: &[SearchRequest],
    limits: &FanoutLimits,
) -> Result<Vec<SearchOutcome>, HubError> {
    let per_second = NonZeroU32::new(limits.max_per_second)
        .ok_or_else(|| HubError::Config("max_per_second must be nonzero".into()))?;
    let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));
    let semaphore = Arc::new(Semaphore::new(limits.max_in_flight as usize));

    let dispatches = requests.iter().map(|request| {
        let limiter = Arc::clone(&limiter);
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| HubError::Config("fan-out semaphore closed".into()))?;
            limiter.until_ready().await;
            api.search(request).await
        }
    });

    join_all(dispatches).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> FlightSearchParams {
        serde_json::from_value(value).unwrap()
    }

    fn base_params() -> serde_json::Value {
        json!({
            "date_from": "2025-04-25",
            "date_to": "2025-04-27",
            "nights_in_dst_from": 7,
            "nights_in_dst_to": 8,
            "return_from": "2025-05-02",
            "return_to": "2025-05-05",
            "fly_from_airports": ["GDN", "WAW"],
            "fly_to_airports": ["MLE"],
            "return_from_airports": ["MLE"],
            "return_to_airports": ["GDN", "WAW"],
            "passengers_map": {"adults": 2, "children": []},
            "currency_code": "PLN",
            "multicity": false,
            "allow_opposite_route": false
        })
    }

    #[test]
    fn return_window_constrains_date_pairs() {
        // Departures 25..=27 with 7..=8 nights yield returns 02..=05/05,
        // all inside the window: 3 departures x 2 nights = 6 date pairs.
        // Round trips over {GDN,WAW}->{MLE}: 2 airport tuples.
        let requests = expand_requests(&params(base_params()));
        assert_eq!(requests.len(), 12);
        assert!(requests
            .iter()
            .all(|r| r.legs[0].origin == r.legs[1].destination));
    }

    #[test]
    fn tight_return_window_drops_pairs() {
        let mut raw = base_params();
        raw["return_to"] = json!("2025-05-02");
        // Only 25+7 nights lands on 05-02.
        let requests = expand_requests(&params(raw));
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn multicity_keeps_mixed_tuples() {
        let mut raw = base_params();
        raw["multicity"] = json!(true);
        let requests = expand_requests(&params(raw));
        // 6 date pairs x (2*1*1*2 = 4) airport tuples.
        assert_eq!(requests.len(), 24);
    }

    #[test]
    fn round_trip_filter_drops_opposite_routes() {
        let raw = json!({
            "date_from": "2025-04-25",
            "date_to": "2025-04-25",
            "nights_in_dst_from": 7,
            "nights_in_dst_to": 7,
            "return_from": "2025-05-02",
            "return_to": "2025-05-02",
            "fly_from_airports": ["GDN"],
            "fly_to_airports": ["MLE", "GAN"],
            "return_from_airports": ["MLE", "GAN"],
            "return_to_airports": ["GDN"],
            "passengers_map": {"adults": 1, "children": []},
            "currency_code": "PLN",
            "multicity": false,
            "allow_opposite_route": false
        });
        let requests = expand_requests(&params(raw));
        // MLE->MLE and GAN->GAN round trips only.
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.legs[0].destination == r.legs[1].origin));
    }
}
