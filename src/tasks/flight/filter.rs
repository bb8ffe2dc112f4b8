//! Three-stage winnowing of fan-out results.
//!
//! The fan-out can return tens of thousands of offers; the filter shrinks
//! them to a bounded, price/time-competitive subset. Order matters: the
//! segment stage is a hard quality gate applied first, while the price and
//! duration stages are volume-reduction gates that only run while the set
//! still exceeds the cap — skipping them otherwise avoids discarding
//! competitive results without need.

use tracing::info;

use super::duration::duration_hours;
use crate::constants::{
    FILTER_DURATION_KEEP_FRACTION, FILTER_PRICE_KEEP_FRACTION, FILTER_RESULTS_CAP,
    FILTER_SEGMENTS_TOLERANCE,
};
use crate::error::HubError;
use crate::types::FlightOffer;

struct ScoredOffer {
    offer: FlightOffer,
    price: f64,
    segments: usize,
    duration: f64,
}

impl ScoredOffer {
    fn score(offer: FlightOffer) -> Result<Self, HubError> {
        let price = offer.price()?;
        let segments = offer.segment_count();
        let duration = offer
            .itineraries
            .iter()
            .map(|i| duration_hours(&i.duration))
            .sum::<Result<f64, _>>()?;
        Ok(Self {
            offer,
            price,
            segments,
            duration,
        })
    }
}

/// Winnows `offers` down to at most
/// [`FILTER_RESULTS_CAP`](crate::constants::FILTER_RESULTS_CAP) competitive
/// entries.
///
/// Stages, in order:
/// 1. empty input returns empty;
/// 2. segment prune: only offers within
///    [`FILTER_SEGMENTS_TOLERANCE`](crate::constants::FILTER_SEGMENTS_TOLERANCE)
///    of the minimum segment count survive;
/// 3. price prune (only while over the cap): ascending sort, keep the
///    cheapest 30%;
/// 4. duration prune (only while over the cap): ascending sort, keep the
///    fastest 30%;
/// 5. truncate to the cap.
pub fn filter_offers(offers: Vec<FlightOffer>) -> Result<Vec<FlightOffer>, HubError> {
    if offers.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored = offers
        .into_iter()
        .map(ScoredOffer::score)
        .collect::<Result<Vec<_>, _>>()?;

    let min_price = scored.iter().map(|s| s.price).fold(f64::INFINITY, f64::min);
    let min_segments = scored.iter().map(|s| s.segments).min().unwrap_or(0);
    let min_duration = scored
        .iter()
        .map(|s| s.duration)
        .fold(f64::INFINITY, f64::min);
    info!(min_price, min_segments, min_duration, "scored fan-out offers");

    let total = scored.len();
    scored.retain(|s| s.segments <= min_segments + FILTER_SEGMENTS_TOLERANCE);
    info!(was = total, is = scored.len(), "post segment prune");

    if scored.len() > FILTER_RESULTS_CAP {
        let total = scored.len();
        scored.sort_by(|a, b| a.price.total_cmp(&b.price));
        scored.truncate((total as f64 * FILTER_PRICE_KEEP_FRACTION).floor() as usize);
        info!(was = total, is = scored.len(), "post price prune");
    }

    if scored.len() > FILTER_RESULTS_CAP {
        let total = scored.len();
        scored.sort_by(|a, b| a.duration.total_cmp(&b.duration));
        scored.truncate((total as f64 * FILTER_DURATION_KEEP_FRACTION).floor() as usize);
        info!(was = total, is = scored.len(), "post duration prune");
    }

    scored.truncate(FILTER_RESULTS_CAP);
    Ok(scored.into_iter().map(|s| s.offer).collect())
}
