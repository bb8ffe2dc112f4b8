//! Flight-preselection handler driven end to end against a fake search API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use taskhub::error::HubError;
use taskhub::executor::registry::TaskHandler;
use taskhub::identity::task_id;
use taskhub::tasks::flight::api::{SearchApi, SearchApiFactory, SearchOutcome};
use taskhub::tasks::flight::fanout::FanoutLimits;
use taskhub::tasks::flight::FlightPreselectionHandler;
use taskhub::types::flight::SearchRequest;
use taskhub::types::FlightOffer;

/// Serves one canned response per search; records token acquisitions.
struct CannedApi {
    responses: Vec<SearchOutcome>,
    tokens: std::sync::atomic::AtomicUsize,
    cursor: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl SearchApi for CannedApi {
    async fn acquire_token(&self) -> Result<(), HubError> {
        self.tokens.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn search(&self, _request: &SearchRequest) -> Result<SearchOutcome, HubError> {
        let index = self.cursor.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.responses[index % self.responses.len()].clone())
    }
}

struct CannedFactory {
    api: Arc<CannedApi>,
}

impl SearchApiFactory for CannedFactory {
    fn make(&self) -> Arc<dyn SearchApi> {
        self.api.clone()
    }
}

fn offer(price: &str, segments: usize) -> FlightOffer {
    serde_json::from_value(json!({
        "price": {"grandTotal": price},
        "itineraries": [{
            "duration": "PT6H30M",
            "segments": (0..segments).map(|_| json!({"carrierCode": "XX"})).collect::<Vec<_>>(),
        }]
    }))
    .unwrap()
}

/// Two departure dates x one nights value, single round-trip airport pair:
/// exactly two search requests.
fn params() -> Value {
    json!({
        "date_from": "2025-04-25",
        "date_to": "2025-04-26",
        "nights_in_dst_from": 7,
        "nights_in_dst_to": 7,
        "return_from": "2025-05-01",
        "return_to": "2025-05-04",
        "fly_from_airports": ["GDN"],
        "fly_to_airports": ["MLE"],
        "return_from_airports": ["MLE"],
        "return_to_airports": ["GDN"],
        "passengers_map": {"adults": 2, "children": [9]},
        "currency_code": "PLN",
        "multicity": false,
        "allow_opposite_route": false
    })
}

#[tokio::test]
async fn handler_aggregates_filters_and_reports() {
    let api = Arc::new(CannedApi {
        responses: vec![
            SearchOutcome {
                status: 200,
                offers: vec![offer("550.00", 1), offer("400.00", 4)],
            },
            SearchOutcome {
                status: 408,
                offers: Vec::new(),
            },
        ],
        tokens: std::sync::atomic::AtomicUsize::new(0),
        cursor: std::sync::atomic::AtomicUsize::new(0),
    });
    let handler = FlightPreselectionHandler::new(
        Arc::new(CannedFactory { api: api.clone() }),
        FanoutLimits {
            max_in_flight: 4,
            max_per_second: 50,
        },
        Duration::from_millis(0),
    );

    let id = task_id("flight_preselection", &params());
    let results = handler.run(&id, params()).await.unwrap();

    // One 200 (two offers) and one synthetic timeout. The 4-segment offer
    // loses to the 1-segment minimum despite its lower price.
    let offers: Vec<FlightOffer> = serde_json::from_value(results).unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].price.grand_total, "550.00");
    // The token was acquired once for the whole invocation.
    assert_eq!(api.tokens.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_params_fail_before_any_dispatch() {
    let api = Arc::new(CannedApi {
        responses: vec![SearchOutcome {
            status: 200,
            offers: Vec::new(),
        }],
        tokens: std::sync::atomic::AtomicUsize::new(0),
        cursor: std::sync::atomic::AtomicUsize::new(0),
    });
    let handler = FlightPreselectionHandler::new(
        Arc::new(CannedFactory { api: api.clone() }),
        FanoutLimits {
            max_in_flight: 4,
            max_per_second: 50,
        },
        Duration::from_millis(0),
    );

    let id = task_id("flight_preselection", &json!({"bogus": true}));
    let result = handler.run(&id, json!({"bogus": true})).await;

    assert!(matches!(result, Err(HubError::InvalidParams(_))));
    assert_eq!(api.tokens.load(std::sync::atomic::Ordering::SeqCst), 0);
}
