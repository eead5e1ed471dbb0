// =============================================================================
// Partition validation
// =============================================================================
//
// Per-symbol input checks.  A symbol that fails any of them is rejected as a
// whole; the other symbols are unaffected.
// =============================================================================

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{MalformedRow, PriceField, PriceRow};

/// Why a symbol's rows were rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    #[error("{symbol}: line {line} could not be parsed: {message}")]
    MalformedRow {
        symbol: String,
        line: u64,
        message: String,
    },
    #[error("{symbol}: row {position} has non-finite {field} ({value})")]
    NonFinitePrice {
        symbol: String,
        position: usize,
        field: PriceField,
        value: f64,
    },
    #[error("{symbol}: row {position} has non-positive {field} ({value})")]
    NonPositivePrice {
        symbol: String,
        position: usize,
        field: PriceField,
        value: f64,
    },
    #[error("{symbol}: row {position} has High {high} below Low {low}")]
    InvertedRange {
        symbol: String,
        position: usize,
        high: f64,
        low: f64,
    },
    #[error("{symbol}: row {position} dated {date} precedes the previous row dated {previous}")]
    OutOfOrder {
        symbol: String,
        position: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

impl PartitionError {
    pub fn symbol(&self) -> &str {
        match self {
            Self::MalformedRow { symbol, .. }
            | Self::NonFinitePrice { symbol, .. }
            | Self::NonPositivePrice { symbol, .. }
            | Self::InvertedRange { symbol, .. }
            | Self::OutOfOrder { symbol, .. } => symbol,
        }
    }
}

/// Check every row of one symbol: no unparseable source records, finite,
/// positive prices, `High >= Low`, and dates that never go backwards (equal
/// dates are allowed).
///
/// `malformed` holds the symbol's records that failed to parse; the first one
/// is reported.
pub fn validate_partition(
    symbol: &str,
    rows: &[PriceRow],
    malformed: &[MalformedRow],
) -> Result<(), PartitionError> {
    if let Some(bad) = malformed.first() {
        return Err(PartitionError::MalformedRow {
            symbol: symbol.to_string(),
            line: bad.line,
            message: bad.message.clone(),
        });
    }

    for (position, row) in rows.iter().enumerate() {
        for (field, value) in row.prices() {
            if !value.is_finite() {
                return Err(PartitionError::NonFinitePrice {
                    symbol: symbol.to_string(),
                    position,
                    field,
                    value,
                });
            }
            if value <= 0.0 {
                return Err(PartitionError::NonPositivePrice {
                    symbol: symbol.to_string(),
                    position,
                    field,
                    value,
                });
            }
        }
        if row.high < row.low {
            return Err(PartitionError::InvertedRange {
                symbol: symbol.to_string(),
                position,
                high: row.high,
                low: row.low,
            });
        }
    }

    if let Some((position, pair)) = rows
        .windows(2)
        .enumerate()
        .find(|(_, pair)| pair[1].date < pair[0].date)
    {
        return Err(PartitionError::OutOfOrder {
            symbol: symbol.to_string(),
            position: position + 1,
            previous: pair[0].date,
            date: pair[1].date,
        });
    }

    Ok(())
}
