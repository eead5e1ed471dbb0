// =============================================================================
// Feature rows and column layout
// =============================================================================
//
// Fully defined output rows and their stable column order.
// =============================================================================

use chrono::NaiveDate;

use crate::pipeline_config::IndicatorParams;
use crate::types::PRICE_COLUMNS;

/// Window of the short moving averages, volatility, momentum and volume mean.
pub const SHORT_WINDOW: usize = 5;
/// Window of the long moving averages.
pub const LONG_WINDOW: usize = 10;

/// The eight features carried forward by one lag.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedFeatures {
    pub lag: usize,
    pub ret: f64,
    pub vol_change: f64,
    pub rsi: f64,
    pub macd: f64,
    pub ema_cross: i8,
    pub atr: f64,
    pub adx: f64,
    pub bb_width: f64,
}

/// One ML-ready record for a (symbol, date).  Every field is defined.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,

    pub ret: f64,
    pub price_change: f64,
    pub high_low_range: f64,
    pub high_low_pct: f64,
    pub close_open_ratio: f64,

    pub sma_short: f64,
    pub sma_long: f64,
    pub ema_short: f64,
    pub ema_long: f64,

    pub volatility: f64,
    pub momentum: f64,

    pub vol_change: f64,
    pub avg_volume: f64,

    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub bb_width: f64,
    pub atr: f64,
    pub adx: f64,

    pub ema_cross: i8,
    pub day_of_week: u32,
    pub month: u32,

    pub lags: Vec<LaggedFeatures>,

    pub next_day_return: f64,
    pub direction: u8,
}

/// Base names of the lagged features, in output order.
fn lagged_names(params: &IndicatorParams) -> [String; 8] {
    [
        "return".to_string(),
        "vol_change".to_string(),
        format!("rsi_{}", params.rsi_period),
        "macd".to_string(),
        "ema_cross".to_string(),
        format!("ATR_{}", params.atr_period),
        format!("ADX_{}", params.adx_period),
        "bb_width".to_string(),
    ]
}

/// Output header, in the order `FeatureRow::to_record` writes values.
pub fn feature_columns(params: &IndicatorParams) -> Vec<String> {
    let mut columns: Vec<String> = PRICE_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(
        [
            "return".to_string(),
            "price_change".to_string(),
            "high_low_range".to_string(),
            "high_low_pct".to_string(),
            "close_open_ratio".to_string(),
            format!("SMA_{SHORT_WINDOW}"),
            format!("SMA_{LONG_WINDOW}"),
            format!("EMA_{SHORT_WINDOW}"),
            format!("EMA_{LONG_WINDOW}"),
            format!("volatility_{SHORT_WINDOW}"),
            format!("momentum_{SHORT_WINDOW}"),
            "vol_change".to_string(),
            format!("avg_volume_{SHORT_WINDOW}"),
            format!("rsi_{}", params.rsi_period),
            "macd".to_string(),
            "macd_signal".to_string(),
            "macd_hist".to_string(),
            "bb_upper".to_string(),
            "bb_middle".to_string(),
            "bb_lower".to_string(),
            "bb_width".to_string(),
            format!("ATR_{}", params.atr_period),
            format!("ADX_{}", params.adx_period),
            "ema_cross".to_string(),
            "day_of_week".to_string(),
            "month".to_string(),
        ],
    );
    let names = lagged_names(params);
    for lag in &params.lags {
        columns.extend(names.iter().map(|name| format!("{name}_lag_{lag}")));
    }
    columns.push("next_day_return".to_string());
    columns.push("direction".to_string());
    columns
}

impl FeatureRow {
    /// Textual record matching `feature_columns`.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.symbol.clone(),
            self.date.format("%Y-%m-%d").to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
        ];
        record.extend(
            [
                self.ret,
                self.price_change,
                self.high_low_range,
                self.high_low_pct,
                self.close_open_ratio,
                self.sma_short,
                self.sma_long,
                self.ema_short,
                self.ema_long,
                self.volatility,
                self.momentum,
                self.vol_change,
                self.avg_volume,
                self.rsi,
                self.macd,
                self.macd_signal,
                self.macd_hist,
                self.bb_upper,
                self.bb_middle,
                self.bb_lower,
                self.bb_width,
                self.atr,
                self.adx,
            ]
            .iter()
            .map(f64::to_string),
        );
        record.push(self.ema_cross.to_string());
        record.push(self.day_of_week.to_string());
        record.push(self.month.to_string());
        for lag in &self.lags {
            record.extend([
                lag.ret.to_string(),
                lag.vol_change.to_string(),
                lag.rsi.to_string(),
                lag.macd.to_string(),
                lag.ema_cross.to_string(),
                lag.atr.to_string(),
                lag.adx.to_string(),
                lag.bb_width.to_string(),
            ]);
        }
        record.push(self.next_day_return.to_string());
        record.push(self.direction.to_string());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_matches_dataset_layout() {
        let columns = feature_columns(&IndicatorParams::default());
        assert_eq!(columns.len(), 7 + 26 + 3 * 8 + 2);
        assert_eq!(columns[7], "return");
        assert_eq!(columns[20], "rsi_14");
        assert_eq!(columns[28], "ATR_14");
        assert_eq!(columns[29], "ADX_14");
        assert_eq!(columns[33], "return_lag_1");
        assert_eq!(columns[40], "bb_width_lag_1");
        assert_eq!(columns[41], "return_lag_2");
        assert_eq!(columns[columns.len() - 2], "next_day_return");
        assert_eq!(columns[columns.len() - 1], "direction");
    }

    #[test]
    fn header_follows_configured_periods() {
        let params = IndicatorParams {
            rsi_period: 7,
            lags: vec![2],
            ..IndicatorParams::default()
        };
        let columns = feature_columns(&params);
        assert!(columns.contains(&"rsi_7".to_string()));
        assert!(columns.contains(&"rsi_7_lag_2".to_string()));
        assert!(!columns.iter().any(|c| c.ends_with("_lag_1")));
    }
}
