// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha = 2 / (span + 1)
//   EMA_0 = x_0
//   EMA_t = alpha * x_t + (1 - alpha) * EMA_{t-1}
//
// The recursion is seeded with the first observed value, not an SMA, so the
// series is defined from the first defined input onwards.
// =============================================================================

use super::series::{defined, Series};

/// Smoothing factor for a given span.
pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Compute the EMA of `values` as a fold over the ordered series.
///
/// # Edge cases
/// - `span == 0` => every position undefined.
/// - Leading undefined inputs stay undefined; the first defined input seeds
///   the recursion.
/// - An undefined input after the seed is undefined at that position and the
///   recursion continues from the last defined state.
pub fn calculate_ema(values: &[Option<f64>], span: usize) -> Series {
    if span == 0 {
        return vec![None; values.len()];
    }
    let alpha = smoothing_factor(span);

    values
        .iter()
        .scan(None::<f64>, |state, value| {
            let Some(x) = *value else {
                return Some(None);
            };
            let next = match *state {
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
                None => x,
            };
            let next = defined(next);
            if next.is_some() {
                *state = next;
            }
            Some(next)
        })
        .collect()
}

/// Crossover signal between a fast and a slow average.
///
/// `+1` where fast > slow, `-1` where fast < slow, `0` on equality or when
/// either side is undefined.
pub fn cross_signal(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<i8> {
    fast.iter()
        .zip(slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) if f > s => 1,
            (Some(f), Some(s)) if f < s => -1,
            _ => 0,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::series::lift;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        let ema = calculate_ema(&lift(&[1.0, 2.0, 3.0]), 0);
        assert!(ema.iter().all(Option::is_none));
    }

    #[test]
    fn ema_seeded_by_first_value() {
        let ema = calculate_ema(&lift(&[7.0, 8.0]), 5);
        assert_eq!(ema[0], Some(7.0));
    }

    #[test]
    fn ema_known_values() {
        // span 5 => alpha = 1/3
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema(&lift(&closes), 5);
        assert_eq!(ema.len(), closes.len());

        let alpha = 2.0 / 6.0;
        let mut expected = closes[0];
        for (i, &c) in closes.iter().enumerate() {
            if i > 0 {
                expected = alpha * c + (1.0 - alpha) * expected;
            }
            let got = ema[i].unwrap();
            assert!((got - expected).abs() < 1e-10, "got {got}, expected {expected}");
        }
    }

    #[test]
    fn ema_skips_leading_undefined() {
        let values = vec![None, None, Some(4.0), Some(6.0)];
        let ema = calculate_ema(&values, 3);
        assert_eq!(ema[0], None);
        assert_eq!(ema[1], None);
        assert_eq!(ema[2], Some(4.0));
        assert!((ema[3].unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn ema_flat_series_stays_flat() {
        let ema = calculate_ema(&lift(&[100.0; 50]), 10);
        assert!(ema.iter().all(|v| (v.unwrap() - 100.0).abs() < 1e-10));
    }

    #[test]
    fn cross_signal_directions() {
        let fast = vec![Some(2.0), Some(1.0), Some(1.0), None];
        let slow = vec![Some(1.0), Some(2.0), Some(1.0), Some(1.0)];
        assert_eq!(cross_signal(&fast, &slow), vec![1, -1, 0, 0]);
    }

    #[test]
    fn cross_signal_on_trends() {
        let rising: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let fast = calculate_ema(&lift(&rising), 5);
        let slow = calculate_ema(&lift(&rising), 10);
        let signal = cross_signal(&fast, &slow);
        assert_eq!(signal[0], 0, "both averages start at the same seed");
        assert!(signal[1..].iter().all(|&s| s == 1));
    }
}
