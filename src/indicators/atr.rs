// =============================================================================
// Average True Range (ATR): simple-average smoothing
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The first bar has no previous close, so its TR is just H - L.
//
// ATR is the trailing SMA of TR over `period` bars, defined from index
// `period - 1`.
//
// Default period: 14
// =============================================================================

use super::series::{defined, rolling_mean, Series};

/// True range of every bar (oldest first).
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Series {
    high.iter()
        .zip(low)
        .enumerate()
        .map(|(i, (&h, &l))| {
            // f64::max skips NaN, so undefined inputs are rejected up front.
            let range = defined(h - l)?;
            match i.checked_sub(1).and_then(|p| close.get(p)) {
                Some(&prev_close) => {
                    let prev_close = defined(prev_close)?;
                    defined(
                        range
                            .max((h - prev_close).abs())
                            .max((l - prev_close).abs()),
                    )
                }
                None => Some(range),
            }
        })
        .collect()
}

/// Compute the ATR series from aligned high/low/close columns.
pub fn calculate_atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Series {
    rolling_mean(&true_range(high, low, close), period)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Split `(high, low, close)` bars into aligned columns.
    fn columns(bars: &[(f64, f64, f64)]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let high = bars.iter().map(|b| b.0).collect();
        let low = bars.iter().map(|b| b.1).collect();
        let close = bars.iter().map(|b| b.2).collect();
        (high, low, close)
    }

    #[test]
    fn atr_period_zero() {
        let (h, l, c) = columns(&[(105.0, 95.0, 102.0); 20]);
        assert!(calculate_atr(&h, &l, &c, 0).iter().all(Option::is_none));
    }

    #[test]
    fn atr_warm_up() {
        let (h, l, c) = columns(&[(105.0, 95.0, 100.0); 20]);
        let atr = calculate_atr(&h, &l, &c, 14);
        assert!(atr[..13].iter().all(Option::is_none));
        assert!((atr[13].unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn first_true_range_is_bar_range() {
        let (h, l, c) = columns(&[(102.0, 98.0, 101.0), (104.0, 99.0, 103.0)]);
        let tr = true_range(&h, &l, &c);
        assert_eq!(tr[0], Some(4.0));
        assert_eq!(tr[1], Some(5.0));
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        // Gap scenario: |H - prevClose| > H - L
        let (h, l, c) = columns(&[
            (105.0, 95.0, 95.0),
            (115.0, 108.0, 112.0), // |115 - 95| = 20 > 7
            (118.0, 110.0, 115.0),
        ]);
        let tr = true_range(&h, &l, &c);
        assert_eq!(tr[1], Some(20.0));
        let atr = calculate_atr(&h, &l, &c, 3);
        // (10 + 20 + 8) / 3
        assert!((atr[2].unwrap() - 38.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn atr_non_negative() {
        let bars: Vec<(f64, f64, f64)> = (0..50)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.5).sin() * 10.0;
                (base + 2.0, base - 2.0, base + 0.5)
            })
            .collect();
        let (h, l, c) = columns(&bars);
        let atr = calculate_atr(&h, &l, &c, 14);
        assert!(atr.iter().flatten().count() > 0);
        assert!(atr.iter().flatten().all(|&v| v >= 0.0));
    }

    #[test]
    fn atr_nan_input_is_undefined() {
        let (h, l, c) = columns(&[
            (105.0, 95.0, 100.0),
            (f64::NAN, 95.0, 100.0),
            (105.0, 95.0, 100.0),
            (105.0, 95.0, 100.0),
        ]);
        let atr = calculate_atr(&h, &l, &c, 3);
        assert_eq!(atr[2], None);
        assert_eq!(atr[3], None);
    }
}
