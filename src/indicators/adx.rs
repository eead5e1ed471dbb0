// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.
//
// Calculation pipeline:
//   1. +DM = diff(high), floored at 0.
//      -DM = |diff(low)|, floored at 0.  Every low move counts with its
//      magnitude, a rising low included.  This is the dataset's historical
//      definition and differs from Wilder's textbook -DM.
//   2. ATR = trailing SMA of true range over `period`.
//   3. +DI = 100 * SMA(+DM) / ATR
//      -DI = 100 * SMA(-DM) / ATR
//   4. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   5. ADX = trailing SMA of DX over `period`.
//
// With period p the first defined ADX sits at index 2p - 1.  A zero ATR or a
// zero DI sum leaves the affected positions undefined.
//
// Interpretation:
//   ADX > 25  => trending market
//   ADX < 20  => ranging / choppy market
// =============================================================================

use super::atr::calculate_atr;
use super::series::{defined, diff, map, ratio, rolling_mean, zip_with, Series};

/// Directional movement columns `(+DM, -DM)`.
pub fn directional_movement(high: &[f64], low: &[f64]) -> (Series, Series) {
    let plus_dm = map(&diff(high), |d| Some(d.max(0.0)));
    let minus_dm = map(&diff(low), |d| Some(d.abs().max(0.0)));
    (plus_dm, minus_dm)
}

/// Compute the ADX series from aligned high/low/close columns.
pub fn calculate_adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Series {
    let (plus_dm, minus_dm) = directional_movement(high, low);
    let atr = calculate_atr(high, low, close, period);

    let plus_di = directional_index(&rolling_mean(&plus_dm, period), &atr);
    let minus_di = directional_index(&rolling_mean(&minus_dm, period), &atr);

    let dx = zip_with(&plus_di, &minus_di, |p, m| {
        ratio((p - m).abs(), p + m).and_then(|r| defined(r * 100.0))
    });

    rolling_mean(&dx, period)
}

// =============================================================================
// Internal helpers
// =============================================================================

fn directional_index(smoothed_dm: &[Option<f64>], atr: &[Option<f64>]) -> Series {
    zip_with(smoothed_dm, atr, |dm, tr| {
        ratio(dm, tr).and_then(|r| defined(100.0 * r))
    })
}
