// =============================================================================
// Per-symbol feature frame
// =============================================================================
//
// Column-wise feature computation for a single symbol.
//
// Every column stays `Option`-valued while it is computed.  Only
// `SymbolFrame::row` collapses a position into a `FeatureRow`, and it does
// so only when every column is defined there.
// =============================================================================

use chrono::Datelike;

use crate::indicators::series::{defined, lift, pct_change, ratio, rolling_mean, rolling_std, shift};
use crate::indicators::{
    calculate_adx, calculate_atr, calculate_bollinger, calculate_ema, calculate_macd,
    calculate_momentum, calculate_rsi, cross_signal, BollingerBands, MacdSeries, Series,
};
use crate::pipeline_config::IndicatorParams;
use crate::types::PriceRow;

use super::row::{FeatureRow, LaggedFeatures, LONG_WINDOW, SHORT_WINDOW};

/// Lagged copies of the eight carried features for one shift.
#[derive(Debug, Clone)]
pub struct LagColumns {
    pub lag: usize,
    pub ret: Series,
    pub vol_change: Series,
    pub rsi: Series,
    pub macd: Series,
    pub ema_cross: Vec<Option<i8>>,
    pub atr: Series,
    pub adx: Series,
    pub bb_width: Series,
}

/// All computed columns of one symbol, aligned with its ordered rows.
#[derive(Debug, Clone)]
pub struct SymbolFrame {
    pub symbol: String,
    pub rows: Vec<PriceRow>,

    pub ret: Series,
    pub price_change: Series,
    pub high_low_range: Series,
    pub high_low_pct: Series,
    pub close_open_ratio: Series,

    pub sma_short: Series,
    pub sma_long: Series,
    pub ema_short: Series,
    pub ema_long: Series,

    pub volatility: Series,
    pub momentum: Series,

    pub vol_change: Series,
    pub avg_volume: Series,

    pub rsi: Series,
    pub macd: MacdSeries,
    pub bollinger: BollingerBands,
    pub atr: Series,
    pub adx: Series,

    pub ema_cross: Vec<i8>,
    pub day_of_week: Vec<u32>,
    pub month: Vec<u32>,

    pub lags: Vec<LagColumns>,

    pub next_day_return: Series,
    pub direction: Vec<Option<u8>>,
}

impl SymbolFrame {
    /// Compute every feature column over `rows`, which must already be in
    /// date order for a single symbol.
    pub fn compute(symbol: &str, rows: Vec<PriceRow>, params: &IndicatorParams) -> Self {
        let open: Vec<f64> = rows.iter().map(|r| r.open).collect();
        let high: Vec<f64> = rows.iter().map(|r| r.high).collect();
        let low: Vec<f64> = rows.iter().map(|r| r.low).collect();
        let close: Vec<f64> = rows.iter().map(|r| r.close).collect();
        let volume: Vec<f64> = rows.iter().map(|r| r.volume as f64).collect();
        let closes = lift(&close);

        // --- Price-based features -------------------------------------------
        let ret = pct_change(&close);
        let price_change = close.iter().zip(&open).map(|(c, o)| defined(c - o)).collect();
        let high_low_range = high.iter().zip(&low).map(|(h, l)| defined(h - l)).collect();
        let high_low_pct = high.iter().zip(&low).map(|(h, l)| ratio(h - l, *l)).collect();
        let close_open_ratio = close.iter().zip(&open).map(|(c, o)| ratio(*c, *o)).collect();

        // --- Moving averages ------------------------------------------------
        let sma_short = rolling_mean(&closes, SHORT_WINDOW);
        let sma_long = rolling_mean(&closes, LONG_WINDOW);
        let ema_short = calculate_ema(&closes, SHORT_WINDOW);
        let ema_long = calculate_ema(&closes, LONG_WINDOW);

        // --- Volatility / momentum -------------------------------------------
        let volatility = rolling_std(&closes, SHORT_WINDOW);
        let momentum = calculate_momentum(&close, SHORT_WINDOW);

        // --- Volume features --------------------------------------------------
        let vol_change = pct_change(&volume);
        let avg_volume = rolling_mean(&lift(&volume), SHORT_WINDOW);

        // --- Technical indicators --------------------------------------------
        let rsi = calculate_rsi(&close, params.rsi_period);
        let macd = calculate_macd(&close, params.macd_fast, params.macd_slow, params.macd_signal);
        let bollinger = calculate_bollinger(&close, params.bb_window, params.bb_num_std);
        let atr = calculate_atr(&high, &low, &close, params.atr_period);
        let adx = calculate_adx(&high, &low, &close, params.adx_period);

        let ema_cross = cross_signal(&ema_short, &ema_long);

        // --- Calendar ---------------------------------------------------------
        let day_of_week = rows.iter().map(|r| r.date.weekday().num_days_from_monday()).collect();
        let month = rows.iter().map(|r| r.date.month()).collect();

        // --- Lags -------------------------------------------------------------
        let cross: Vec<Option<i8>> = ema_cross.iter().copied().map(Some).collect();
        let lags = params
            .lags
            .iter()
            .map(|&lag| LagColumns {
                lag,
                ret: shift(&ret, lag),
                vol_change: shift(&vol_change, lag),
                rsi: shift(&rsi, lag),
                macd: shift(&macd.macd, lag),
                ema_cross: shift(&cross, lag),
                atr: shift(&atr, lag),
                adx: shift(&adx, lag),
                bb_width: shift(&bollinger.width, lag),
            })
            .collect();

        // --- Targets ----------------------------------------------------------
        let next_day_return: Series = (0..close.len())
            .map(|i| {
                let next = close.get(i + 1)?;
                ratio(*next, close[i]).and_then(|r| defined(r - 1.0))
            })
            .collect();
        let direction = next_day_return
            .iter()
            .map(|r| r.map(|r| u8::from(r > 0.0)))
            .collect();

        Self {
            symbol: symbol.to_string(),
            rows,
            ret,
            price_change,
            high_low_range,
            high_low_pct,
            close_open_ratio,
            sma_short,
            sma_long,
            ema_short,
            ema_long,
            volatility,
            momentum,
            vol_change,
            avg_volume,
            rsi,
            macd,
            bollinger,
            atr,
            adx,
            ema_cross,
            day_of_week,
            month,
            lags,
            next_day_return,
            direction,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The feature row at `i`, or `None` when any of its fields is undefined.
    pub fn row(&self, i: usize) -> Option<FeatureRow> {
        let raw = self.rows.get(i)?;

        let lags = self
            .lags
            .iter()
            .map(|l| {
                Some(LaggedFeatures {
                    lag: l.lag,
                    ret: l.ret[i]?,
                    vol_change: l.vol_change[i]?,
                    rsi: l.rsi[i]?,
                    macd: l.macd[i]?,
                    ema_cross: l.ema_cross[i]?,
                    atr: l.atr[i]?,
                    adx: l.adx[i]?,
                    bb_width: l.bb_width[i]?,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(FeatureRow {
            symbol: raw.symbol.clone(),
            date: raw.date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            ret: self.ret[i]?,
            price_change: self.price_change[i]?,
            high_low_range: self.high_low_range[i]?,
            high_low_pct: self.high_low_pct[i]?,
            close_open_ratio: self.close_open_ratio[i]?,
            sma_short: self.sma_short[i]?,
            sma_long: self.sma_long[i]?,
            ema_short: self.ema_short[i]?,
            ema_long: self.ema_long[i]?,
            volatility: self.volatility[i]?,
            momentum: self.momentum[i]?,
            vol_change: self.vol_change[i]?,
            avg_volume: self.avg_volume[i]?,
            rsi: self.rsi[i]?,
            macd: self.macd.macd[i]?,
            macd_signal: self.macd.signal[i]?,
            macd_hist: self.macd.histogram[i]?,
            bb_upper: self.bollinger.upper[i]?,
            bb_middle: self.bollinger.middle[i]?,
            bb_lower: self.bollinger.lower[i]?,
            bb_width: self.bollinger.width[i]?,
            atr: self.atr[i]?,
            adx: self.adx[i]?,
            ema_cross: self.ema_cross[i],
            day_of_week: self.day_of_week[i],
            month: self.month[i],
            lags,
            next_day_return: self.next_day_return[i]?,
            direction: self.direction[i]?,
        })
    }

    /// Rows that survive the completeness filter, in date order.
    pub fn complete_rows(&self) -> Vec<FeatureRow> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows_from_closes(closes: &[f64]) -> Vec<PriceRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceRow {
                symbol: "NABIL".to_string(),
                date: start + chrono::Days::new(i as u64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000 + (i as u64 % 7) * 150,
            })
            .collect()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.35).sin() * 6.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn columns_align_with_rows() {
        let frame = SymbolFrame::compute("NABIL", rows_from_closes(&wave(40)), &IndicatorParams::default());
        assert_eq!(frame.len(), 40);
        assert_eq!(frame.ret.len(), 40);
        assert_eq!(frame.adx.len(), 40);
        assert_eq!(frame.lags.len(), 3);
        assert_eq!(frame.lags[2].bb_width.len(), 40);
        assert_eq!(frame.direction.len(), 40);
    }

    #[test]
    fn first_complete_row_after_longest_warm_up() {
        let frame = SymbolFrame::compute("NABIL", rows_from_closes(&wave(60)), &IndicatorParams::default());
        // ADX_14 is first defined at 27, its third lag at 30.
        assert!(frame.row(29).is_none());
        let first = frame.row(30).expect("row 30 is complete");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(frame.row(59).is_none(), "last row has no next-day target");
        assert_eq!(frame.complete_rows().len(), 29);
    }

    #[test]
    fn lag_copies_earlier_values() {
        let frame = SymbolFrame::compute("NABIL", rows_from_closes(&wave(50)), &IndicatorParams::default());
        let lag2 = frame.lags.iter().find(|l| l.lag == 2).unwrap();
        assert_eq!(lag2.ret[0], None);
        assert_eq!(lag2.ret[1], None);
        for i in 2..50 {
            assert_eq!(lag2.ret[i], frame.ret[i - 2]);
            assert_eq!(lag2.rsi[i], frame.rsi[i - 2]);
            assert_eq!(lag2.ema_cross[i], Some(frame.ema_cross[i - 2]));
        }
    }

    #[test]
    fn calendar_features_use_monday_zero() {
        // 2024-01-01 was a Monday.
        let frame = SymbolFrame::compute("NABIL", rows_from_closes(&wave(8)), &IndicatorParams::default());
        assert_eq!(&frame.day_of_week[..7], &[0, 1, 2, 3, 4, 5, 6]);
        assert!(frame.month.iter().all(|&m| m == 1));
    }

    #[test]
    fn zero_previous_volume_is_undefined() {
        let mut rows = rows_from_closes(&wave(5));
        rows[1].volume = 0;
        let frame = SymbolFrame::compute("NABIL", rows, &IndicatorParams::default());
        assert!(frame.vol_change[1].is_some());
        assert_eq!(frame.vol_change[2], None);
    }

    #[test]
    fn direction_follows_next_day_return() {
        let frame = SymbolFrame::compute(
            "NABIL",
            rows_from_closes(&[10.0, 11.0, 11.0, 10.0]),
            &IndicatorParams::default(),
        );
        assert_eq!(frame.direction, vec![Some(1), Some(0), Some(0), None]);
        assert_eq!(frame.next_day_return[3], None);
    }

    #[test]
    fn empty_input() {
        let frame = SymbolFrame::compute("NABIL", Vec::new(), &IndicatorParams::default());
        assert!(frame.is_empty());
        assert!(frame.complete_rows().is_empty());
    }
}
