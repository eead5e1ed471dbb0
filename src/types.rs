// =============================================================================
// Shared types used across the feature pipeline
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Column headers of the raw OHLCV table, in file order.
pub const PRICE_COLUMNS: [&str; 7] = ["Symbol", "Date", "Open", "High", "Low", "Close", "Volume"];

/// One raw daily OHLCV observation for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Date", deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume", deserialize_with = "de_volume")]
    pub volume: u64,
}

/// A raw record that named its symbol but could not be parsed into a
/// [`PriceRow`].  It disqualifies that symbol only.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRow {
    pub symbol: String,
    /// 1-based line in the source file, header included.
    pub line: u64,
    pub message: String,
}

/// A loaded raw table: the rows that parsed, plus the ones that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    pub rows: Vec<PriceRow>,
    pub malformed: Vec<MalformedRow>,
}

impl From<Vec<PriceRow>> for PriceTable {
    fn from(rows: Vec<PriceRow>) -> Self {
        Self {
            rows,
            malformed: Vec::new(),
        }
    }
}

/// Which price field of a row a validation message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl std::fmt::Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::High => write!(f, "High"),
            Self::Low => write!(f, "Low"),
            Self::Close => write!(f, "Close"),
        }
    }
}

impl PriceRow {
    /// The four prices paired with their field names.
    pub fn prices(&self) -> [(PriceField, f64); 4] {
        [
            (PriceField::Open, self.open),
            (PriceField::High, self.high),
            (PriceField::Low, self.low),
            (PriceField::Close, self.close),
        ]
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

/// Parse a calendar date from the textual forms the data files carry:
/// `2024-01-31`, `2024-01-31 00:00:00`, `2024-01-31T00:00:00` or RFC 3339.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Convert a volume reading to whole shares.  Negative or non-finite
/// readings are rejected; fractional readings are rounded.
pub fn volume_from_f64(v: f64) -> Option<u64> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    let shares = v.round();
    if shares != v {
        debug!(raw = v, rounded = shares, "fractional volume rounded");
    }
    Some(shares as u64)
}

fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

fn de_volume<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(volume_from_f64)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid volume '{raw}'")))
}
