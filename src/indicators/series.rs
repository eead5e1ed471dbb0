// =============================================================================
// Series primitives shared by every indicator
// =============================================================================
//
// A `Series` is aligned one-to-one with the trading days of a single symbol.
// `None` marks an undefined position: warm-up history, a division by zero or
// any other non-finite result.  Arithmetic on an undefined operand is itself
// undefined, so a missing value can never turn into a runtime fault.
//
// All rolling windows are right-aligned: position `i` summarises
// `[i - window + 1, i]` and needs every one of those inputs to be defined.
// =============================================================================

/// Ordered, position-aligned output of an indicator.
pub type Series = Vec<Option<f64>>;

/// Keep `value` only when it is finite.
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `num / den`, undefined when the divisor is zero or the result is not finite.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    defined(num / den)
}

/// Wrap a fully observed input column as a `Series`.
pub fn lift(values: &[f64]) -> Series {
    values.iter().map(|&v| defined(v)).collect()
}

/// Apply `f` to every defined position.
pub fn map(values: &[Option<f64>], f: impl Fn(f64) -> Option<f64>) -> Series {
    values.iter().map(|v| v.and_then(&f)).collect()
}

/// Combine two aligned series position by position.  A position is defined
/// only when both inputs are defined and `f` accepts them.
pub fn zip_with(
    a: &[Option<f64>],
    b: &[Option<f64>],
    f: impl Fn(f64, f64) -> Option<f64>,
) -> Series {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y),
            _ => None,
        })
        .collect()
}

/// Shift a column forward by `lag` positions; the first `lag` positions
/// become undefined.
pub fn shift<T: Copy>(values: &[Option<T>], lag: usize) -> Vec<Option<T>> {
    (0..values.len())
        .map(|i| i.checked_sub(lag).and_then(|j| values[j]))
        .collect()
}

/// Day-over-day difference `x[i] - x[i-1]`; undefined at position 0.
pub fn diff(values: &[f64]) -> Series {
    (0..values.len())
        .map(|i| {
            let prev = values.get(i.checked_sub(1)?)?;
            defined(values[i] - prev)
        })
        .collect()
}

/// Simple return `x[i] / x[i-1] - 1`; undefined at position 0 and wherever
/// the previous value is zero.
pub fn pct_change(values: &[f64]) -> Series {
    (0..values.len())
        .map(|i| {
            let prev = values.get(i.checked_sub(1)?)?;
            ratio(values[i], *prev).and_then(|r| defined(r - 1.0))
        })
        .collect()
}

/// Inputs of the right-aligned window ending at `end`, or `None` when the
/// window reaches before the start or contains an undefined position.
fn full_window(values: &[Option<f64>], end: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 {
        return None;
    }
    let start = (end + 1).checked_sub(window)?;
    values[start..=end].iter().copied().collect()
}

/// Trailing simple moving average over `window` positions.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    (0..values.len())
        .map(|i| {
            let slice = full_window(values, i, window)?;
            defined(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Trailing sample standard deviation (denominator `window - 1`).
///
/// A window of one observation has no sample deviation and is undefined.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if window < 2 {
                return None;
            }
            let slice = full_window(values, i, window)?;
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance =
                slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
            defined(variance.sqrt())
        })
        .collect()
}
