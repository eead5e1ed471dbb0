// =============================================================================
// Relative Strength Index (RSI): simple-average smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1: Compute day-over-day differences of the closes.
// Step 2: gain = positive part of the delta, loss = magnitude of the
//          negative part.
// Step 3: avg_gain / avg_loss = trailing SMA of gains / losses over `period`.
// Step 4: RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The first defined value is at index `period` (position 0 has no delta).
// =============================================================================

use super::series::{defined, diff, map, rolling_mean, zip_with, Series};

/// Compute the RSI series for the given `closes` and `period`.
///
/// # Edge cases
/// - `period == 0` => every position undefined.
/// - Average loss of zero with a positive average gain saturates to 100.0.
/// - Average loss and average gain both zero (flat window) is undefined.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Series {
    let deltas = diff(closes);
    let gains = map(&deltas, |d| Some(d.max(0.0)));
    let losses = map(&deltas, |d| Some((-d).max(0.0)));

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    zip_with(&avg_gain, &avg_loss, rsi_from_averages)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        // RS is infinite when there are only gains.
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    defined(100.0 - 100.0 / (1.0 + rs))
}
