// =============================================================================
// Momentum: absolute price change over a look-back period
// =============================================================================
//
//   momentum_t = close_t - close_{t - period}
//
// Positive momentum indicates upward drift; negative indicates downward.

use super::series::{defined, Series};

/// Calculate momentum for the given closing prices and period.
///
/// The first `period` positions are undefined.
pub fn calculate_momentum(closes: &[f64], period: usize) -> Series {
    (0..closes.len())
        .map(|i| {
            let past = closes[i.checked_sub(period)?];
            defined(closes[i] - past)
        })
        .collect()
}
