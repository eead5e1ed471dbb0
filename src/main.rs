// =============================================================================
// Stock Features: Main Entry Point
// =============================================================================

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stock_features::dataset::{
    convert_symbol_dump, read_price_rows, read_symbols, save_feature_table,
};
use stock_features::ingest::fetch_all;
use stock_features::{FeatureAssembler, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "stock-features",
    version,
    about = "Download daily OHLCV history and engineer ML-ready technical features"
)]
struct Cli {
    /// Pipeline configuration file (JSON); defaults to $STOCK_FEATURES_CONFIG,
    /// then `pipeline_config.json`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert the symbol-metadata JSON dump into the CSV symbol list
    Symbols {
        #[arg(long, default_value = "stock.json")]
        from_json: PathBuf,
        #[arg(long, default_value = "stock_symbol_list.csv")]
        output: PathBuf,
    },
    /// Download chart history for every symbol in a symbol list
    Fetch {
        /// CSV with a `symbol` column
        #[arg(long, default_value = "stock_symbol_list.csv")]
        symbols: PathBuf,
    },
    /// Build the feature table from a raw OHLCV CSV
    Build {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var_os("STOCK_FEATURES_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("pipeline_config.json"));
    let config = PipelineConfig::load_or_init(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        PipelineConfig::default()
    });

    match cli.command {
        Command::Symbols { from_json, output } => {
            convert_symbol_dump(&from_json, &output)?;
        }
        Command::Fetch { symbols } => {
            let symbols = read_symbols(&symbols)?;
            info!(count = symbols.len(), "fetching chart history");
            let summary = fetch_all(&config.fetch, &symbols).await?;
            if summary.saved == 0 && summary.failed > 0 {
                bail!("every request failed ({} failures)", summary.failed);
            }
        }
        Command::Build { input, output } => {
            let prices = read_price_rows(&input)?;
            let assembler = FeatureAssembler::from_config(&config);
            let assembly = tokio::task::spawn_blocking(move || assembler.assemble(prices)).await?;

            save_feature_table(&output, &assembly.table)?;

            if config.fail_on_rejected && !assembly.rejected.is_empty() {
                bail!("{} symbol(s) rejected", assembly.rejected.len());
            }
        }
    }

    Ok(())
}
