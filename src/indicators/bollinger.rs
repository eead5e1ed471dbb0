// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the trailing *sample* standard
// deviation.  The width is the absolute distance between the outer bands:
// width = upper - lower = 2kσ.

use super::series::{defined, lift, rolling_mean, rolling_std, zip_with, Series};

/// The four aligned Bollinger outputs.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
    pub width: Series,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// Positions before `window` closes have accumulated are undefined.
pub fn calculate_bollinger(closes: &[f64], window: usize, num_std: f64) -> BollingerBands {
    let closes = lift(closes);
    let middle = rolling_mean(&closes, window);
    let std = rolling_std(&closes, window);

    let upper = zip_with(&middle, &std, |m, s| defined(m + num_std * s));
    let lower = zip_with(&middle, &std, |m, s| defined(m - num_std * s));
    let width = zip_with(&upper, &lower, |u, l| defined(u - l));

    BollingerBands {
        upper,
        middle,
        lower,
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0);
        assert!(bb.upper[..19].iter().all(Option::is_none));
        let (upper, middle, lower) = (bb.upper[19].unwrap(), bb.middle[19].unwrap(), bb.lower[19].unwrap());
        assert!((middle - 10.5).abs() < 1e-10);
        assert!(upper > middle);
        assert!(lower < middle);
        assert!(bb.width[19].unwrap() > 0.0);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(bb.middle.iter().all(Option::is_none));
        assert!(bb.width.iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_flat() {
        let bb = calculate_bollinger(&[100.0; 20], 20, 2.0);
        assert!((bb.width[19].unwrap() - 0.0).abs() < 1e-10);
        assert_eq!(bb.upper[19], bb.lower[19]);
    }

    #[test]
    fn width_is_two_k_sigma() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.7).cos() * 3.0).collect();
        let k = 2.0;
        let bb = calculate_bollinger(&closes, 20, k);
        let std = rolling_std(&lift(&closes), 20);
        for i in 19..60 {
            let width = bb.width[i].unwrap();
            assert!((width - 2.0 * k * std[i].unwrap()).abs() < 1e-9);
            assert_eq!(width, bb.upper[i].unwrap() - bb.lower[i].unwrap());
        }
    }
}
