use std::fs;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use watch_core::{AnalysisError, FilingProvider, PriceProvider, PricesState};

use edgar_client::EdgarClient;
use filing_enrichment::{build_filing_context, DEFAULT_CONTEXT_SIZE};
use financial_analysis::{FinancialAnalyzer, FinancialCache};
use polygon_client::{detect_price_drop, PolygonClient};

use crate::config::WatchConfig;

/// Calendar days of price history fetched per ticker
pub const PRICE_WINDOW_DAYS: u32 = 7;

/// Look-back window for filings considered as alert context
pub const FILING_LOOKBACK_DAYS: i64 = 90;

/// Form types considered relevant to a price drop
pub const ALERT_FORM_TYPES: &[&str] = &["8-K", "10-Q", "10-K"];

/// Per-run outcome across the watchlist
#[derive(Debug, Default, Serialize)]
pub struct PipelineSummary {
    pub success: Vec<String>,
    pub failed: Vec<String>,
}

/// Per-ticker monitor pipeline: price window → drop alert → filing
/// enrichment → ROIC-WACC spread, each stage persisting its JSON artifact.
///
/// Tickers are processed sequentially and independently; one ticker's
/// failure never aborts the rest of the watchlist.
pub struct WatchPipeline<P, F>
where
    F: FilingProvider,
{
    config: WatchConfig,
    prices: P,
    filings: F,
    analyzer: FinancialAnalyzer<F>,
}

impl WatchPipeline<PolygonClient, EdgarClient> {
    /// Wire the pipeline to the real Polygon and EDGAR providers.
    pub fn from_config(config: WatchConfig) -> Result<Self, AnalysisError> {
        let prices = PolygonClient::new(config.polygon_api_key.clone());
        let filings = EdgarClient::new(config.edgar_identity.clone())?;
        Ok(Self::new(config, prices, filings))
    }
}

impl<P, F> WatchPipeline<P, F>
where
    P: PriceProvider,
    F: FilingProvider + Clone,
{
    pub fn new(config: WatchConfig, prices: P, filings: F) -> Self {
        let analyzer =
            FinancialAnalyzer::new(filings.clone(), FinancialCache::new(&config.data_dir));
        Self {
            config,
            prices,
            filings,
            analyzer,
        }
    }

    pub async fn run(&self) -> PipelineSummary {
        let mut summary = PipelineSummary::default();

        for ticker in &self.config.tickers {
            match self.process_ticker(ticker).await {
                Ok(()) => {
                    info!(ticker, "ticker processed");
                    summary.success.push(ticker.clone());
                }
                Err(e) if e.is_insufficient_data() => {
                    warn!(ticker, error = %e, "skipping ticker, needs more history");
                    summary.failed.push(ticker.clone());
                }
                Err(e) => {
                    error!(ticker, error = %e, "ticker processing failed");
                    summary.failed.push(ticker.clone());
                }
            }
        }

        info!(
            success = summary.success.len(),
            failed = summary.failed.len(),
            "pipeline complete"
        );
        summary
    }

    async fn process_ticker(&self, ticker: &str) -> Result<(), AnalysisError> {
        let closes = self
            .prices
            .daily_closes(ticker, PRICE_WINDOW_DAYS)
            .await?;
        let state = PricesState::new(closes);
        self.write_artifact(&format!("prices_state_{ticker}.json"), &state)?;

        let mut alert = detect_price_drop(&state.prices, self.config.drop_threshold_pct)?;

        if alert.alert_triggered {
            let drop_date = state
                .prices
                .iter()
                .map(|c| c.date)
                .max()
                .unwrap_or_else(|| Utc::now().date_naive());

            match self
                .filings
                .recent_filings(ticker, FILING_LOOKBACK_DAYS, ALERT_FORM_TYPES)
                .await
            {
                Ok(filings) => {
                    alert.filing_context =
                        build_filing_context(&filings, drop_date, DEFAULT_CONTEXT_SIZE);
                }
                Err(e) => {
                    // The alert still ships, just without context.
                    warn!(ticker, error = %e, "filing enrichment failed");
                }
            }
        }
        self.write_artifact(&format!("alerts_{ticker}.json"), &alert)?;

        let spread = self
            .analyzer
            .spread(ticker, self.config.history_years)
            .await?;
        self.write_artifact(&format!("financial_{ticker}.json"), &spread)?;

        Ok(())
    }

    fn write_artifact<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AnalysisError> {
        fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| AnalysisError::Io(format!("Failed to create data dir: {e}")))?;

        let path = self.config.data_dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| AnalysisError::Io(format!("Failed to serialize {name}: {e}")))?;
        fs::write(&path, json)
            .map_err(|e| AnalysisError::Io(format!("Failed to write {}: {e}", path.display())))?;

        info!(artifact = %path.display(), "wrote artifact");
        Ok(())
    }
}
