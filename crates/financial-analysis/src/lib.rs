//! Financial-analysis engine: accounting data extraction from multi-year
//! annual filings, ROIC and WACC derivation under fallback/sanity-check
//! policies, and ROIC-WACC spread classification, wrapped by a per-ticker
//! on-disk cache.
//!
//! Formulas:
//! - ROIC = NOPAT / Invested Capital
//! - NOPAT = Operating Income × (1 − Tax Rate)
//! - Invested Capital = Total Assets − Cash − Non-Interest Liabilities
//! - Cost of Equity: Re = Rf + β × (Rm − Rf)
//! - Cost of Debt: Rd = Interest Expense / Total Debt
//! - WACC = (E/V × Re) + (D/V × Rd × (1 − Tc))

pub mod cache;
pub mod fields;
pub mod model;
pub mod roic;
pub mod spread;
pub mod wacc;

#[cfg(test)]
pub(crate) mod testutil;

pub use cache::{CachedFinancials, FinancialCache, CACHE_MAX_AGE_DAYS};
pub use fields::extract_statement_value;
pub use model::*;
pub use roic::{extract_roic_history, MIN_ROIC_YEARS};
pub use spread::build_spread_result;
pub use wacc::{extract_wacc_components, wacc_from_components};

use tracing::info;
use watch_core::{AnalysisError, FilingProvider};

/// Default number of fiscal years of history to analyze
pub const DEFAULT_HISTORY_YEARS: usize = 5;

/// Cache-wrapped facade over the extraction and calculation stages.
///
/// Each stage is memoized independently in the per-ticker cache file; the
/// cache never affects the shape of a result, only whether the filing
/// provider gets asked again.
pub struct FinancialAnalyzer<P> {
    provider: P,
    cache: FinancialCache,
}

impl<P: FilingProvider> FinancialAnalyzer<P> {
    pub fn new(provider: P, cache: FinancialCache) -> Self {
        Self { provider, cache }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Historical ROIC for `ticker` over up to `years` fiscal years.
    pub async fn roic_history(
        &self,
        ticker: &str,
        years: usize,
    ) -> Result<RoicHistory, AnalysisError> {
        if let Some(cached) = self.cache.load(ticker).and_then(|c| c.roic_history) {
            return Ok(cached);
        }

        let roic = roic::extract_roic_history(&self.provider, ticker, years).await?;
        self.cache.store_roic_history(ticker, &roic);
        Ok(roic)
    }

    /// WACC components from the latest annual filing.
    ///
    /// Cached components embed the default CAPM assumptions, so the cache
    /// is bypassed entirely whenever the caller overrides any of them.
    pub async fn wacc_components(
        &self,
        ticker: &str,
        assumptions: &WaccAssumptions,
    ) -> Result<WaccComponents, AnalysisError> {
        if assumptions.is_default() {
            if let Some(cached) = self.cache.load(ticker).and_then(|c| c.wacc_components) {
                return Ok(cached);
            }
        }

        let components =
            wacc::extract_wacc_components(&self.provider, ticker, assumptions).await?;

        if assumptions.is_default() {
            self.cache.store_wacc_components(ticker, &components);
        }
        Ok(components)
    }

    /// Weighted average cost of capital, optionally with ±100bp risk-free
    /// sensitivity scenarios.
    pub async fn wacc(
        &self,
        ticker: &str,
        assumptions: &WaccAssumptions,
        sensitivity: bool,
    ) -> Result<WaccResult, AnalysisError> {
        let components = self.wacc_components(ticker, assumptions).await?;
        let result = wacc::wacc_from_components(components, sensitivity);
        info!(
            ticker,
            wacc = format!("{:.2}%", result.baseline * 100.0),
            "calculated WACC"
        );
        Ok(result)
    }

    /// ROIC-WACC spread with trend and durability classification.
    pub async fn spread(&self, ticker: &str, years: usize) -> Result<SpreadResult, AnalysisError> {
        if let Some(cached) = self.cache.load(ticker).and_then(|c| c.spread_result) {
            return Ok(cached);
        }

        let roic = self.roic_history(ticker, years).await?;
        // Sensitivity scenarios always ride along for downstream consumers;
        // per-year spreads subtract only the baseline.
        let wacc = self.wacc(ticker, &WaccAssumptions::default(), true).await?;

        let result = spread::build_spread_result(roic, wacc);
        info!(
            ticker,
            spread = format!("{:.2}%", result.current_spread * 100.0),
            trend = result.trend.as_str(),
            durability = result.durability.as_str(),
            "calculated ROIC-WACC spread"
        );

        self.cache.store_spread_result(ticker, &result);
        Ok(result)
    }
}
