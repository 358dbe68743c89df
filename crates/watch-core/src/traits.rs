use crate::{AnalysisError, AnnualFiling, DailyClose, Filing};
use async_trait::async_trait;

/// Trait for market-data providers (daily close history)
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch up to `days` most recent daily closes for a ticker.
    async fn daily_closes(&self, ticker: &str, days: u32) -> Result<Vec<DailyClose>, AnalysisError>;
}

/// Trait for regulatory-filing providers.
///
/// An unknown company is an error (`FinancialData`); a known company with no
/// annual filings yields `Ok(None)` / a short list. Callers must not rely on
/// the ordering of `annual_filings`; sort by fiscal year before use.
#[async_trait]
pub trait FilingProvider: Send + Sync {
    async fn latest_annual_filing(
        &self,
        ticker: &str,
    ) -> Result<Option<AnnualFiling>, AnalysisError>;

    async fn annual_filings(
        &self,
        ticker: &str,
        count: usize,
    ) -> Result<Vec<AnnualFiling>, AnalysisError>;

    /// Recent filings of the given form types within `days_back` days,
    /// for alert enrichment.
    async fn recent_filings(
        &self,
        ticker: &str,
        days_back: i64,
        form_types: &[&str],
    ) -> Result<Vec<Filing>, AnalysisError>;
}
