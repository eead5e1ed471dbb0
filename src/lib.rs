// =============================================================================
// Stock Features: per-symbol technical feature engineering for daily OHLCV
// =============================================================================
//
// raw OHLCV CSV -> partition by symbol -> indicator engine -> complete rows
// -> ML-ready CSV.  The `ingest` module downloads the raw tables.
// =============================================================================

pub mod dataset;
pub mod features;
pub mod indicators;
pub mod ingest;
pub mod pipeline_config;
pub mod types;

pub use features::{Assembly, FeatureAssembler, FeatureRow, FeatureTable, PartitionError};
pub use pipeline_config::{FetchConfig, IndicatorParams, PipelineConfig};
pub use types::{MalformedRow, PriceRow, PriceTable};
