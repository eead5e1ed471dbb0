// =============================================================================
// Chart-history REST client
// =============================================================================
//
// The charting endpoint only answers requests that look like they come from
// its own web chart: every request carries the chart page as `Referer`, an
// `X-Requested-With: XMLHttpRequest` marker and a browser user agent.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use tracing::{debug, instrument};

use crate::pipeline_config::FetchConfig;

use super::history::HistoryResponse;

/// Client for the `/history` endpoint of the charting API.
#[derive(Clone)]
pub struct ChartClient {
    base_url: String,
    history_path: String,
    fsk: String,
    client: reqwest::Client,
}

impl ChartClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer).context("invalid referer header")?,
        );
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("invalid user-agent header")?,
        );
        default_headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %config.base_url, "ChartClient initialised");

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            history_path: config.history_path.clone(),
            fsk: config.fsk.clone(),
            client,
        })
    }

    /// GET the full history of `symbol` at `resolution`.
    #[instrument(skip(self), name = "chart::history")]
    pub async fn history(&self, symbol: &str, resolution: &str) -> Result<HistoryResponse> {
        let url = format!("{}{}", self.base_url, self.history_path);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fsk", self.fsk.as_str()),
                ("symbol", symbol),
                ("resolution", resolution),
                ("frame", "1"),
            ])
            .send()
            .await
            .with_context(|| format!("GET history for {symbol} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("history for {symbol} returned {status}: {body}");
        }

        let body: HistoryResponse = resp
            .json()
            .await
            .with_context(|| format!("failed to parse history response for {symbol}"))?;

        debug!(status = %body.s, bars = body.t.len(), "history received");
        Ok(body)
    }
}
