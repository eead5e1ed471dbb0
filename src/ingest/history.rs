// =============================================================================
// Chart-history payload
// =============================================================================
//
// The charting endpoint answers with parallel arrays:
//   { "s": "ok", "t": [unix seconds], "o": [..], "h": [..], "l": [..],
//     "c": [..], "v": [..] }
// Any status other than "ok" (typically "no_data") means the symbol has no
// history at that resolution.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};

use crate::types::volume_from_f64;

/// Raw body of a history request.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub s: String,
    #[serde(default)]
    pub t: Vec<i64>,
    #[serde(default)]
    pub o: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    #[serde(default)]
    pub l: Vec<f64>,
    #[serde(default)]
    pub c: Vec<f64>,
    #[serde(default)]
    pub v: Vec<f64>,
}

/// One bar as stored in the raw price files.  Intraday resolutions keep
/// their time of day; the feature pipeline reads only the calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryBar {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Date", serialize_with = "ser_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

fn ser_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format("%Y-%m-%d %H:%M:%S"))
}

impl HistoryResponse {
    pub fn is_ok(&self) -> bool {
        self.s == "ok"
    }

    /// Zip the parallel arrays into bars for `symbol`.
    ///
    /// A non-"ok" status or an empty time axis yields no bars; arrays of
    /// unequal length are an error.
    pub fn into_bars(self, symbol: &str) -> Result<Vec<HistoryBar>> {
        if !self.is_ok() || self.t.is_empty() {
            return Ok(Vec::new());
        }

        let n = self.t.len();
        let lengths = [self.o.len(), self.h.len(), self.l.len(), self.c.len(), self.v.len()];
        if lengths.iter().any(|&len| len != n) {
            bail!("{symbol}: history arrays have mismatched lengths (t={n}, o/h/l/c/v={lengths:?})");
        }

        (0..n)
            .map(|i| -> Result<HistoryBar> {
                let timestamp = DateTime::from_timestamp(self.t[i], 0)
                    .with_context(|| format!("{symbol}: timestamp {} out of range", self.t[i]))?
                    .naive_utc();
                let volume = volume_from_f64(self.v[i])
                    .with_context(|| format!("{symbol}: invalid volume {} at {timestamp}", self.v[i]))?;
                Ok(HistoryBar {
                    symbol: symbol.to_string(),
                    timestamp,
                    open: self.o[i],
                    high: self.h[i],
                    low: self.l[i],
                    close: self.c[i],
                    volume,
                })
            })
            .collect()
    }
}
