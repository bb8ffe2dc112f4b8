//! ISO 8601 itinerary-duration parsing.
//!
//! The search API reports per-itinerary durations as ISO 8601 durations of
//! the `PnW` / `PnD` / `PnDTnHnMnS` family (`PT14H30M`, `P1DT2H`, `PT35M`,
//! `P2D`). Parsing is numeric — designator values accumulate into total
//! seconds — so zero durations (`PT0S`) and minutes with leading zeros
//! (`PT05M`) are as valid as any other value. Year and month designators
//! have no fixed length in seconds and are rejected.

use crate::error::HubError;

/// Total hours of an ISO 8601 duration, rounded to two decimals.
///
/// The two-decimal rounding is kept deliberately for output parity with
/// downstream consumers of the hour values.
///
/// # Examples
///
/// ```
/// use taskhub::tasks::flight::duration::duration_hours;
///
/// assert_eq!(duration_hours("PT14H30M").unwrap(), 14.5);
/// assert_eq!(duration_hours("P1DT2H").unwrap(), 26.0);
/// assert_eq!(duration_hours("PT50M").unwrap(), 0.83);
/// assert_eq!(duration_hours("PT0S").unwrap(), 0.0);
/// assert!(duration_hours("14h30m").is_err());
/// ```
pub fn duration_hours(iso: &str) -> Result<f64, HubError> {
    let seconds = total_seconds(iso)?;
    Ok((seconds as f64 / 3600.0 * 100.0).round() / 100.0)
}

/// Parses a duration into total seconds.
fn total_seconds(iso: &str) -> Result<u64, HubError> {
    let invalid = || HubError::InvalidDuration(iso.to_string());

    let rest = iso
        .trim()
        .to_ascii_uppercase()
        .strip_prefix('P')
        .map(str::to_string)
        .ok_or_else(invalid)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time.to_string())),
        Some(_) => return Err(invalid()),
        None => (rest.as_str(), None),
    };

    let mut seconds = 0u64;
    let mut components = 0usize;

    for (value, designator) in designators(date_part).ok_or_else(invalid)? {
        components += 1;
        let unit = match designator {
            'W' => 7 * 86_400,
            'D' => 86_400,
            _ => return Err(invalid()),
        };
        seconds = seconds
            .checked_add(value.checked_mul(unit).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;
    }

    if let Some(time) = time_part {
        for (value, designator) in designators(&time).ok_or_else(invalid)? {
            components += 1;
            let unit = match designator {
                'H' => 3_600,
                'M' => 60,
                'S' => 1,
                _ => return Err(invalid()),
            };
            seconds = seconds
                .checked_add(value.checked_mul(unit).ok_or_else(invalid)?)
                .ok_or_else(invalid)?;
        }
    }

    if components == 0 {
        return Err(invalid());
    }
    Ok(seconds)
}

/// Splits `"1D"` / `"14H30M"`-style runs into `(value, designator)` pairs.
/// Returns `None` on anything but digit runs each followed by a single
/// ASCII letter.
fn designators(part: &str) -> Option<Vec<(u64, char)>> {
    let mut pairs = Vec::new();
    let mut digits = String::new();
    for ch in part.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if ch.is_ascii_alphabetic() && !digits.is_empty() {
            pairs.push((digits.parse().ok()?, ch));
            digits.clear();
        } else {
            return None;
        }
    }
    digits.is_empty().then_some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_hours_and_minutes() {
        assert_eq!(duration_hours("PT2H").unwrap(), 2.0);
        assert_eq!(duration_hours("PT2H45M").unwrap(), 2.75);
        assert_eq!(duration_hours("PT35M").unwrap(), 0.58);
    }

    #[test]
    fn day_combinations() {
        assert_eq!(duration_hours("P2D").unwrap(), 48.0);
        assert_eq!(duration_hours("P1DT2H30M").unwrap(), 26.5);
        assert_eq!(duration_hours("P1DT45M").unwrap(), 24.75);
        assert_eq!(duration_hours("P1W").unwrap(), 168.0);
    }

    #[test]
    fn edge_values_parse() {
        assert_eq!(duration_hours("PT0S").unwrap(), 0.0);
        assert_eq!(duration_hours("PT05M").unwrap(), 0.08);
        assert_eq!(duration_hours("pt1h").unwrap(), 1.0);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        for bad in ["", "P", "PT", "14H", "PT14X", "P1Y", "P1M", "PTH", "PT1H2"] {
            assert!(duration_hours(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn rounding_is_two_decimals() {
        // 100 minutes = 1.666... hours
        assert_eq!(duration_hours("PT100M").unwrap(), 1.67);
    }
}
