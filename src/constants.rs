//! Shared constants: result-key derivation, filter tuning, batch bounds.

/// Suffix appended to a task id to form the result blob's object key.
pub const RESULTS_KEY_SUFFIX: &str = "-results";

/// Built-in task name for the flight-preselection handler.
pub const TASK_FLIGHT_PRESELECTION: &str = "flight_preselection";

/// Extra segments (beyond the observed minimum) an offer may carry and still
/// survive the segment-prune stage.
pub const FILTER_SEGMENTS_TOLERANCE: usize = 1;

/// Fraction of offers kept by the price-prune stage.
pub const FILTER_PRICE_KEEP_FRACTION: f64 = 0.3;

/// Fraction of offers kept by the duration-prune stage.
pub const FILTER_DURATION_KEEP_FRACTION: f64 = 0.3;

/// Hard cap on the number of offers a filtered result set may contain. The
/// price and duration prune stages only run while the set exceeds this cap.
pub const FILTER_RESULTS_CAP: usize = 250;

/// Maximum number of object keys a single `delete_batch` call may carry.
/// Callers chunk larger sets.
pub const DELETE_BATCH_MAX: usize = 1000;

/// Maximum queue messages fetched per worker poll.
pub const RECEIVE_BATCH_MAX: usize = 10;

/// Returns `len` bytes as megabytes, rounded to two decimals. Used for
/// size observability when storing compressed blobs and result payloads.
pub fn megabytes(len: usize) -> f64 {
    (len as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::megabytes;

    #[test]
    fn megabytes_rounds_to_two_decimals() {
        assert_eq!(megabytes(0), 0.0);
        assert_eq!(megabytes(1024 * 1024), 1.0);
        assert_eq!(megabytes(1_572_864), 1.5);
    }
}
