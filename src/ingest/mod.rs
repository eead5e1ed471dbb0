// =============================================================================
// Chart-history ingestion
// =============================================================================
//
// Raw OHLCV ingestion from the charting API.
//
// Layout on disk, per configured resolution:
//   <output_dir>/<code>/<SYMBOL>.csv               latest full history
//   <output_dir>/<code>/all_all_time_stocks.csv    append-only master
// =============================================================================

pub mod client;
pub mod history;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::dataset::{append_records, ensure_price_file, save_records};
use crate::pipeline_config::FetchConfig;

pub use client::ChartClient;
pub use history::{HistoryBar, HistoryResponse};

/// File name of the per-resolution master table.
pub const MASTER_FILE: &str = "all_all_time_stocks.csv";

/// Outcome counts of a fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub saved: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Folder of one resolution under the output directory.
pub fn resolution_dir(output_dir: &Path, code: &str) -> PathBuf {
    output_dir.join(code)
}

/// Fetch every symbol at every configured resolution.
///
/// A failure for one symbol is logged and counted; the run moves on to the
/// next symbol.  Only filesystem setup errors abort the run.
pub async fn fetch_all(config: &FetchConfig, symbols: &[String]) -> Result<FetchSummary> {
    let client = ChartClient::new(config)?;
    let delay = Duration::from_millis(config.request_delay_ms);
    let mut summary = FetchSummary::default();

    for resolution in &config.resolutions {
        let dir = resolution_dir(&config.output_dir, &resolution.code);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let master = dir.join(MASTER_FILE);
        ensure_price_file(&master)?;

        info!(resolution = %resolution.code, label = %resolution.label, "fetching resolution");

        for symbol in symbols {
            match fetch_symbol(&client, symbol, &resolution.code, &dir, &master).await {
                Ok(0) => {
                    warn!(symbol = %symbol, label = %resolution.label, "no data");
                    summary.empty += 1;
                }
                Ok(bars) => {
                    info!(symbol = %symbol, label = %resolution.label, bars, "saved");
                    summary.saved += 1;
                }
                Err(e) => {
                    error!(symbol = %symbol, label = %resolution.label, error = %e, "fetch failed");
                    summary.failed += 1;
                }
            }
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        saved = summary.saved,
        empty = summary.empty,
        failed = summary.failed,
        "fetch finished"
    );
    Ok(summary)
}

/// Fetch one symbol, write its own file and append it to the master.
/// Returns the number of bars written.
async fn fetch_symbol(
    client: &ChartClient,
    symbol: &str,
    resolution: &str,
    dir: &Path,
    master: &Path,
) -> Result<usize> {
    let bars = client.history(symbol, resolution).await?.into_bars(symbol)?;
    if bars.is_empty() {
        return Ok(0);
    }
    save_records(dir.join(format!("{symbol}.csv")), &bars)?;
    append_records(master, &bars)?;
    Ok(bars.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_folders() {
        let dir = resolution_dir(Path::new("stock_data"), "1D");
        assert_eq!(dir, PathBuf::from("stock_data/1D"));
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(ChartClient::new(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn client_rejects_invalid_header_values() {
        let config = FetchConfig {
            referer: "bad\nvalue".to_string(),
            ..FetchConfig::default()
        };
        assert!(ChartClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn unreachable_host_counts_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let config = FetchConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            output_dir: dir.path().to_path_buf(),
            request_delay_ms: 0,
            timeout_secs: 2,
            ..FetchConfig::default()
        };
        let symbols = vec!["NABIL".to_string()];
        let summary = fetch_all(&config, &symbols).await.unwrap();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.saved, 0);
        assert!(dir.path().join("1D").join(MASTER_FILE).exists());
        assert!(!dir.path().join("1D").join("NABIL.csv").exists());
    }
}
