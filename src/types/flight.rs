//! Typed flight-search task parameters and external-API offer shapes.
//!
//! Task parameters arrive as free-form JSON but are deserialized into
//! [`FlightSearchParams`] before any expansion happens, so range and type
//! errors surface immediately instead of deep inside the fan-out. Offer
//! shapes keep the fields the filter needs as typed accessors and carry
//! everything else through `#[serde(flatten)]`, so stored results preserve
//! the provider payload byte-for-byte in meaning.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HubError;

/// Traveler composition for a search: adult count plus children ages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerMix {
    /// Number of adult travelers.
    pub adults: u32,
    /// Ages of child travelers, one entry per child.
    pub children: Vec<u32>,
}

/// Optional cabin-class restriction forwarded to the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    /// No restriction (the API default).
    #[default]
    Any,
    First,
    Business,
    PremiumEconomy,
    Economy,
}

impl CabinClass {
    /// The wire code the search API expects, or `None` for no restriction.
    pub fn api_code(&self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::First => Some("FIRST"),
            Self::Business => Some("BUSINESS"),
            Self::PremiumEconomy => Some("PREMIUM_ECONOMY"),
            Self::Economy => Some("ECONOMY"),
        }
    }
}

/// Parameters of the flight-preselection task.
///
/// Dates are inclusive ranges in ISO `YYYY-MM-DD` form; airport fields are
/// IATA code sets for the outbound and return legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    /// First acceptable departure date.
    pub date_from: NaiveDate,
    /// Last acceptable departure date.
    pub date_to: NaiveDate,
    /// Minimum nights spent at the destination.
    pub nights_in_dst_from: u32,
    /// Maximum nights spent at the destination.
    pub nights_in_dst_to: u32,
    /// First acceptable return date.
    pub return_from: NaiveDate,
    /// Last acceptable return date.
    pub return_to: NaiveDate,
    /// Departure airports of the outbound leg.
    pub fly_from_airports: Vec<String>,
    /// Arrival airports of the outbound leg.
    pub fly_to_airports: Vec<String>,
    /// Departure airports of the return leg.
    pub return_from_airports: Vec<String>,
    /// Arrival airports of the return leg.
    pub return_to_airports: Vec<String>,
    /// Traveler composition.
    pub passengers_map: PassengerMix,
    /// ISO 4217 currency for prices.
    pub currency_code: String,
    /// When `false`, only true round trips are searched (outbound arrival ==
    /// return departure and outbound departure == return arrival).
    pub multicity: bool,
    /// Informational routing flag, logged with the combination counts.
    pub allow_opposite_route: bool,
    /// Optional cabin restriction.
    #[serde(default)]
    pub cabin_class: CabinClass,
}

/// One leg of a concrete search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightLeg {
    /// IATA code of the departure airport.
    pub origin: String,
    /// IATA code of the arrival airport.
    pub destination: String,
    /// Departure date of this leg.
    pub departure_date: NaiveDate,
}

/// One concrete combination sent to the search API: an outbound and return
/// leg plus the shared passenger/currency context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Outbound and return legs, in order.
    pub legs: Vec<FlightLeg>,
    /// Traveler composition.
    pub passengers: PassengerMix,
    /// ISO 4217 currency for prices.
    pub currency_code: String,
    /// Optional cabin restriction.
    pub cabin_class: CabinClass,
}

/// Price block of an offer. Unknown sibling fields are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPrice {
    /// Total price as a decimal string, as the API serves it.
    #[serde(rename = "grandTotal")]
    pub grand_total: String,
    /// Provider fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One itinerary of an offer: an ISO 8601 duration plus its segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    /// Total itinerary duration, ISO 8601 (`PT14H30M`, `P1DT2H`, ...).
    pub duration: String,
    /// Flight segments; opaque to the filter beyond their count.
    pub segments: Vec<Value>,
    /// Provider fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One offer returned by the search API.
///
/// Used as filter input; survivors are persisted verbatim inside the task's
/// result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    /// Price block.
    pub price: OfferPrice,
    /// Itineraries (one per leg for round trips).
    pub itineraries: Vec<Itinerary>,
    /// Provider fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightOffer {
    /// Total price as a number.
    pub fn price(&self) -> Result<f64, HubError> {
        self.price
            .grand_total
            .parse::<f64>()
            .map_err(|_| HubError::InvalidPrice(self.price.grand_total.clone()))
    }

    /// Total segment count across all itineraries.
    pub fn segment_count(&self) -> usize {
        self.itineraries.iter().map(|i| i.segments.len()).sum()
    }
}
