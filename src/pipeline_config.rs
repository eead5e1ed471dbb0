// =============================================================================
// Pipeline Configuration: indicator parameters, fetch settings, atomic save
// =============================================================================
//
// Every tunable parameter of the feature pipeline and of the chart-history
// fetcher lives here.  All fields carry `#[serde(default)]` so that adding
// new fields never breaks loading an older config file.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bb_window() -> usize {
    20
}

fn default_bb_num_std() -> f64 {
    2.0
}

fn default_atr_period() -> usize {
    14
}

fn default_adx_period() -> usize {
    14
}

fn default_lags() -> Vec<usize> {
    vec![1, 2, 3]
}

fn default_base_url() -> String {
    "https://nepsealpha.com".to_string()
}

fn default_history_path() -> String {
    "/trading/1/history".to_string()
}

fn default_referer() -> String {
    "https://nepsealpha.com/trading/chart".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_fsk() -> String {
    "1770567065937".to_string()
}

fn default_resolutions() -> Vec<Resolution> {
    vec![
        Resolution {
            code: "1".to_string(),
            label: "full_day".to_string(),
        },
        Resolution {
            code: "1D".to_string(),
            label: "daily".to_string(),
        },
    ]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("stock_data")
}

fn default_request_delay_ms() -> u64 {
    200
}

fn default_timeout_secs() -> u64 {
    10
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Window and smoothing parameters of the technical indicators.
///
/// Output column names embed the periods (`rsi_14`, `ATR_14`, `ADX_14`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Fast EMA span of the MACD line.
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    /// Slow EMA span of the MACD line.
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    /// EMA span of the MACD signal line.
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    #[serde(default = "default_bb_window")]
    pub bb_window: usize,

    /// Band distance in sample standard deviations.
    #[serde(default = "default_bb_num_std")]
    pub bb_num_std: f64,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    #[serde(default = "default_adx_period")]
    pub adx_period: usize,

    /// Shifts applied to the lagged feature set, in output order.
    #[serde(default = "default_lags")]
    pub lags: Vec<usize>,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bb_window: default_bb_window(),
            bb_num_std: default_bb_num_std(),
            atr_period: default_atr_period(),
            adx_period: default_adx_period(),
            lags: default_lags(),
        }
    }
}

// =============================================================================
// FetchConfig
// =============================================================================

/// A chart resolution to download: the upstream code and the folder label
/// used in log lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub code: String,
    pub label: String,
}

/// Settings of the chart-history fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_history_path")]
    pub history_path: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Session key the history endpoint expects as the `fsk` query parameter.
    #[serde(default = "default_fsk")]
    pub fsk: String,

    /// Resolutions fetched in order; each lands in `<output_dir>/<code>/`.
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<Resolution>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Pause between two symbol requests.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            history_path: default_history_path(),
            referer: default_referer(),
            user_agent: default_user_agent(),
            fsk: default_fsk(),
            resolutions: default_resolutions(),
            output_dir: default_output_dir(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// PipelineConfig
// =============================================================================

/// Top-level configuration of the pipeline.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub indicators: IndicatorParams,

    /// When set, input rows are expected in (symbol, date) order already and a
    /// symbol whose dates go backwards is rejected instead of being sorted.
    #[serde(default)]
    pub require_sorted_input: bool,

    /// Engineer symbols on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Make `build` fail when any symbol was rejected.
    #[serde(default)]
    pub fail_on_rejected: bool,

    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            require_sorted_input: false,
            parallel: true,
            fail_on_rejected: false,
            fetch: FetchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse pipeline config from {}", path.display()))?;

        info!(
            path = %path.display(),
            lags = ?config.indicators.lags,
            parallel = config.parallel,
            "pipeline config loaded"
        );

        Ok(config)
    }

    /// Load configuration from `path`, first writing the defaults there when
    /// no file exists yet.  An existing file is never overwritten.
    pub fn load_or_init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        info!(path = %path.display(), "default pipeline config written");
        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise pipeline config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "pipeline config saved (atomic)");
        Ok(())
    }
}
