// =============================================================================
// Feature Assembly
// =============================================================================
//
// Partitions the raw table by symbol, engineers each partition independently
// and concatenates the complete rows:
//
//   partition -> map(pure per-symbol computation) -> concatenate
//
// No state is shared between partitions, so the map runs on the rayon pool
// when enabled.
// =============================================================================

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::pipeline_config::{IndicatorParams, PipelineConfig};
use crate::types::{MalformedRow, PriceRow, PriceTable};

mod frame;
mod row;
mod validate;

pub use frame::{LagColumns, SymbolFrame};
pub use row::{feature_columns, FeatureRow, LaggedFeatures, LONG_WINDOW, SHORT_WINDOW};
pub use validate::{validate_partition, PartitionError};

/// The emitted dataset: a header plus fully defined rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one symbol, in date order.
    pub fn rows_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a FeatureRow> + 'a {
        self.rows.iter().filter(move |r| r.symbol == symbol)
    }
}

/// Result of one assembly run.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub table: FeatureTable,
    /// Symbols whose rows failed validation; they contribute no output.
    pub rejected: Vec<PartitionError>,
}

/// Turns a raw OHLCV table into the ML-ready feature table.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    params: IndicatorParams,
    require_sorted_input: bool,
    parallel: bool,
}

impl FeatureAssembler {
    pub fn new(params: IndicatorParams) -> Self {
        Self {
            params,
            require_sorted_input: false,
            parallel: true,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.indicators.clone())
            .with_require_sorted_input(config.require_sorted_input)
            .with_parallel(config.parallel)
    }

    pub fn with_require_sorted_input(mut self, require_sorted_input: bool) -> Self {
        self.require_sorted_input = require_sorted_input;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Split the raw table into per-symbol series, in order of first
    /// appearance.
    ///
    /// Unless sorted input is required, rows are first sorted by
    /// (symbol, date); the sort is stable, so rows sharing a date keep their
    /// input order.
    pub fn partition(&self, mut rows: Vec<PriceRow>) -> Vec<(String, Vec<PriceRow>)> {
        if !self.require_sorted_input {
            rows.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
        }

        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut partitions: Vec<(String, Vec<PriceRow>)> = Vec::new();
        for row in rows {
            match slots.get(&row.symbol) {
                Some(&slot) => partitions[slot].1.push(row),
                None => {
                    slots.insert(row.symbol.clone(), partitions.len());
                    partitions.push((row.symbol.clone(), vec![row]));
                }
            }
        }
        partitions
    }

    /// Validate one symbol's ordered rows and compute all of its columns.
    pub fn engineer(&self, symbol: &str, rows: Vec<PriceRow>) -> Result<SymbolFrame, PartitionError> {
        self.engineer_with(symbol, rows, &[])
    }

    /// As [`engineer`](Self::engineer), also rejecting the symbol when any of
    /// its source records failed to parse.
    pub fn engineer_with(
        &self,
        symbol: &str,
        rows: Vec<PriceRow>,
        malformed: &[MalformedRow],
    ) -> Result<SymbolFrame, PartitionError> {
        validate_partition(symbol, &rows, malformed)?;
        Ok(SymbolFrame::compute(symbol, rows, &self.params))
    }

    /// Run the full pipeline over a raw table.
    ///
    /// Symbols with unparseable records are rejected along with the rest of
    /// their rows; a symbol that only appears in such records still shows up
    /// in `rejected`.
    pub fn assemble(&self, input: impl Into<PriceTable>) -> Assembly {
        let start = Instant::now();
        let PriceTable { rows, malformed } = input.into();
        let input_rows = rows.len() + malformed.len();

        let mut malformed_by_symbol: HashMap<String, Vec<MalformedRow>> = HashMap::new();
        for bad in malformed {
            malformed_by_symbol.entry(bad.symbol.clone()).or_default().push(bad);
        }

        let mut partitions = self.partition(rows);
        let mut orphans: Vec<&String> = malformed_by_symbol
            .keys()
            .filter(|symbol| !partitions.iter().any(|(s, _)| s == *symbol))
            .collect();
        orphans.sort();
        partitions.extend(orphans.into_iter().map(|symbol| (symbol.clone(), Vec::new())));
        let symbols = partitions.len();

        let engineer = |(symbol, rows): (String, Vec<PriceRow>)| {
            let bad = malformed_by_symbol.get(&symbol).map(Vec::as_slice).unwrap_or(&[]);
            let frame = self.engineer_with(&symbol, rows, bad)?;
            let complete = frame.complete_rows();
            debug!(
                symbol = %symbol,
                rows_in = frame.len(),
                rows_out = complete.len(),
                "symbol engineered"
            );
            Ok::<_, PartitionError>(complete)
        };

        let results: Vec<Result<Vec<FeatureRow>, PartitionError>> = if self.parallel {
            partitions.into_par_iter().map(engineer).collect()
        } else {
            partitions.into_iter().map(engineer).collect()
        };

        let mut table = FeatureTable::new(feature_columns(&self.params));
        let mut rejected = Vec::new();
        for result in results {
            match result {
                Ok(rows) => table.rows.extend(rows),
                Err(e) => {
                    warn!(symbol = %e.symbol(), error = %e, "symbol rejected");
                    rejected.push(e);
                }
            }
        }

        info!(
            input_rows,
            symbols,
            output_rows = table.len(),
            rejected = rejected.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "feature table assembled"
        );

        Assembly { table, rejected }
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(IndicatorParams::default())
    }
}
