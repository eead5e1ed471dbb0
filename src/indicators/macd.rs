// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD line = EMA(close, fast) - EMA(close, slow)
//   signal    = EMA(MACD line, signal)
//   histogram = MACD line - signal
//
// All three EMAs are seeded with their first observed value, so every series
// is defined from position 0.
// =============================================================================

use super::ema::calculate_ema;
use super::series::{defined, lift, zip_with, Series};

/// The three aligned MACD outputs.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let closes = lift(closes);
    let ema_fast = calculate_ema(&closes, fast);
    let ema_slow = calculate_ema(&closes, slow);

    let macd = zip_with(&ema_fast, &ema_slow, |f, s| defined(f - s));
    let signal = calculate_ema(&macd, signal);
    let histogram = zip_with(&macd, &signal, |m, s| defined(m - s));

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}
