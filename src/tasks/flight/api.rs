//! External flight-search API client.
//!
//! [`SearchApi`] is the seam the fan-out engine dispatches through; the
//! production implementation is [`FlightOffersClient`], an OAuth
//! client-credentials `reqwest` client speaking the provider's
//! flight-offers wire contract. Tests substitute fakes at the trait.
//!
//! A client instance caches its access token for its own lifetime: the
//! handler builds one client per task invocation, so the token is acquired
//! once per invocation and reused across the whole fan-out, never renewed
//! per request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::HubError;
use crate::types::{FlightOffer, SearchRequest};

/// Outcome of one search request.
///
/// Timeouts surface as a synthetic `408` outcome rather than an error, so
/// one slow request never aborts a fan-out batch.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// HTTP status of the response (or synthetic 408 on timeout).
    pub status: u16,
    /// Offers carried by a 200 response; empty otherwise.
    pub offers: Vec<FlightOffer>,
}

/// The search-API boundary the fan-out engine dispatches through.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Acquires (and caches) an access token for this instance.
    async fn acquire_token(&self) -> Result<(), HubError>;

    /// Executes one search. Transport-level failures other than timeouts
    /// are errors; HTTP error statuses and timeouts are data.
    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, HubError>;
}

/// Builds one [`SearchApi`] instance per task invocation.
pub trait SearchApiFactory: Send + Sync {
    /// Creates a fresh client with no cached token.
    fn make(&self) -> Arc<dyn SearchApi>;
}

/// Connection settings of the flight-offers API.
#[derive(Debug, Clone)]
pub struct SearchApiConfig {
    /// Base URL, e.g. `https://travel.api.example.com`.
    pub base_url: String,
    /// OAuth client id.
    pub api_key: String,
    /// OAuth client secret.
    pub api_secret: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<FlightOffer>,
}

/// Production flight-offers client.
pub struct FlightOffersClient {
    http: reqwest::Client,
    config: SearchApiConfig,
    token: RwLock<Option<String>>,
}

impl FlightOffersClient {
    /// Creates a client with no cached token.
    pub fn new(http: reqwest::Client, config: SearchApiConfig) -> Self {
        Self {
            http,
            config,
            token: RwLock::new(None),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Correlation id sent with every request.
    fn client_ref() -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn request_token(&self) -> Result<String, HubError> {
        let url = self.api_url("v1/security/oauth2/token");
        debug!(%url, "requesting access token");
        let response = self
            .http
            .post(&url)
            .header("X-Client-Ref", Self::client_ref())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.api_key.as_str()),
                ("client_secret", self.config.api_secret.as_str()),
            ])
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::TokenExchange(format!(
                "token endpoint returned {status}"
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| HubError::TokenExchange(e.to_string()))?;
        Ok(token.access_token)
    }

    fn request_body(&self, request: &SearchRequest) -> Value {
        let origin_destinations: Vec<Value> = request
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| {
                json!({
                    "id": index + 1,
                    "originLocationCode": leg.origin,
                    "destinationLocationCode": leg.destination,
                    "departureDateTimeRange": {"date": leg.departure_date.format("%Y-%m-%d").to_string()},
                })
            })
            .collect();

        let adults = request.passengers.adults;
        let travelers: Vec<Value> = (0..adults)
            .map(|index| {
                json!({
                    "id": index + 1,
                    "travelerType": "ADULT",
                    "fareOptions": ["STANDARD"],
                })
            })
            .chain(request.passengers.children.iter().enumerate().map(
                |(index, _age)| {
                    json!({
                        "id": index as u32 + 1 + adults,
                        "travelerType": "CHILD",
                        "fareOptions": ["STANDARD"],
                    })
                },
            ))
            .collect();

        let mut search_criteria = json!({
            "allowAlternativeFareOptions": true,
            "additionalInformation": {"chargeableCheckedBags": true},
        });
        if let Some(cabin) = request.cabin_class.api_code() {
            let ids: Vec<usize> = (1..=request.legs.len()).collect();
            search_criteria["flightFilters"] = json!({
                "cabinRestrictions": [{"cabin": cabin, "originDestinationIds": ids}],
            });
        }

        json!({
            "currencyCode": request.currency_code,
            "searchCriteria": search_criteria,
            "originDestinations": origin_destinations,
            "travelers": travelers,
            "sources": ["GDS", "PYTON", "LTC", "EAC", "NDC"],
        })
    }
}

#[async_trait]
impl SearchApi for FlightOffersClient {
    async fn acquire_token(&self) -> Result<(), HubError> {
        if self.token.read().is_some() {
            return Ok(());
        }
        let token = self.request_token().await?;
        *self.token.write() = Some(token);
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, HubError> {
        self.acquire_token().await?;
        let bearer = self.token.read().clone().unwrap_or_default();

        let url = self.api_url("v2/shopping/flight-offers");
        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer)
            .header("X-Client-Ref", Self::client_ref())
            .json(&self.request_body(request))
            .timeout(self.config.timeout)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return Ok(SearchOutcome {
                    status: StatusCode::REQUEST_TIMEOUT.as_u16(),
                    offers: Vec::new(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let status = response.status().as_u16();
        if status != StatusCode::OK.as_u16() {
            return Ok(SearchOutcome {
                status,
                offers: Vec::new(),
            });
        }

        let offers: OffersResponse = response.json().await?;
        Ok(SearchOutcome {
            status,
            offers: offers.data,
        })
    }
}

/// Factory producing [`FlightOffersClient`]s that share one connection pool
/// but cache tokens independently.
pub struct FlightOffersClientFactory {
    http: reqwest::Client,
    config: SearchApiConfig,
}

impl FlightOffersClientFactory {
    /// Creates a factory around a shared `reqwest` client.
    pub fn new(http: reqwest::Client, config: SearchApiConfig) -> Self {
        Self { http, config }
    }
}

impl SearchApiFactory for FlightOffersClientFactory {
    fn make(&self) -> Arc<dyn SearchApi> {
        Arc::new(FlightOffersClient::new(
            self.http.clone(),
            self.config.clone(),
        ))
    }
}
