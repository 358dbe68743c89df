use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;
use watch_core::AnalysisError;

use financial_analysis::DEFAULT_HISTORY_YEARS;
use polygon_client::DEFAULT_DROP_THRESHOLD_PCT;

/// Runtime configuration for the monitor pipeline. The watchlist comes from
/// a JSON config file; secrets come from the environment.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Tickers to monitor, uppercased and deduplicated
    pub tickers: Vec<String>,
    pub drop_threshold_pct: f64,
    pub history_years: usize,
    /// Directory for per-ticker JSON artifacts and the financial cache
    pub data_dir: PathBuf,
    pub polygon_api_key: String,
    /// SEC EDGAR User-Agent identity, threaded into every filing request
    pub edgar_identity: String,
}

#[derive(Debug, Deserialize)]
struct WatchlistFile {
    monitored_stocks: Vec<String>,
    #[serde(default)]
    drop_threshold_pct: Option<f64>,
    #[serde(default)]
    history_years: Option<usize>,
    #[serde(default)]
    data_dir: Option<PathBuf>,
}

impl WatchConfig {
    /// Load config from a watchlist file plus `POLYGON_API_KEY` and
    /// `EDGAR_IDENTITY` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            AnalysisError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let file: WatchlistFile = serde_json::from_str(&contents).map_err(|e| {
            AnalysisError::ConfigError(format!("Invalid watchlist in {}: {e}", path.display()))
        })?;

        let polygon_api_key = env::var("POLYGON_API_KEY").map_err(|_| {
            AnalysisError::ConfigError("POLYGON_API_KEY environment variable not set".to_string())
        })?;
        let edgar_identity = env::var("EDGAR_IDENTITY").map_err(|_| {
            AnalysisError::ConfigError("EDGAR_IDENTITY environment variable not set".to_string())
        })?;

        Ok(Self {
            tickers: normalize_tickers(file.monitored_stocks)?,
            drop_threshold_pct: file.drop_threshold_pct.unwrap_or(DEFAULT_DROP_THRESHOLD_PCT),
            history_years: file.history_years.unwrap_or(DEFAULT_HISTORY_YEARS),
            data_dir: file.data_dir.unwrap_or_else(|| PathBuf::from("data")),
            polygon_api_key,
            edgar_identity,
        })
    }
}

/// Uppercase and deduplicate the configured tickers, preserving first
/// occurrence order. An empty list is a config error.
fn normalize_tickers(raw: Vec<String>) -> Result<Vec<String>, AnalysisError> {
    if raw.is_empty() {
        return Err(AnalysisError::ConfigError(
            "no tickers specified in watchlist".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    let mut tickers = Vec::with_capacity(raw.len());
    for ticker in raw {
        let ticker = ticker.trim().to_uppercase();
        if seen.insert(ticker.clone()) {
            tickers.push(ticker);
        } else {
            warn!(ticker, "duplicate ticker in watchlist, skipping");
        }
    }
    Ok(tickers)
}
