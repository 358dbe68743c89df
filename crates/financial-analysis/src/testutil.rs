use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use watch_core::{AnalysisError, AnnualFiling, Filing, FilingProvider, FinancialStatement};

/// Canned filing provider for engine tests. Counts provider hits so tests
/// can prove cache behavior.
pub(crate) struct StaticProvider {
    filings: Vec<AnnualFiling>,
    known: bool,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn unknown_company() -> Self {
        Self {
            filings: Vec::new(),
            known: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn provider_with(filings: Vec<AnnualFiling>) -> StaticProvider {
    StaticProvider {
        filings,
        known: true,
        calls: AtomicUsize::new(0),
    }
}

#[async_trait]
impl FilingProvider for StaticProvider {
    async fn latest_annual_filing(
        &self,
        ticker: &str,
    ) -> Result<Option<AnnualFiling>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.known {
            return Err(AnalysisError::FinancialData(format!(
                "No company found for {ticker}"
            )));
        }
        Ok(self
            .filings
            .iter()
            .max_by_key(|f| f.fiscal_year)
            .cloned())
    }

    async fn annual_filings(
        &self,
        ticker: &str,
        count: usize,
    ) -> Result<Vec<AnnualFiling>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.known {
            return Err(AnalysisError::FinancialData(format!(
                "No company found for {ticker}"
            )));
        }
        let mut filings = self.filings.clone();
        filings.sort_by_key(|f| std::cmp::Reverse(f.fiscal_year));
        filings.truncate(count);
        Ok(filings)
    }

    async fn recent_filings(
        &self,
        _ticker: &str,
        _days_back: i64,
        _form_types: &[&str],
    ) -> Result<Vec<Filing>, AnalysisError> {
        Ok(Vec::new())
    }
}

/// Single-period statement from (concept, value) pairs
pub(crate) fn statement_rows(rows: &[(&str, f64)]) -> FinancialStatement {
    let mut stmt = FinancialStatement {
        periods: vec!["2024-09-30".to_string()],
        rows: Vec::new(),
    };
    for (concept, value) in rows {
        stmt.push_row(*concept, vec![Some(*value)]);
    }
    stmt
}

pub(crate) fn filing(
    fiscal_year: i32,
    income_statement: FinancialStatement,
    balance_sheet: FinancialStatement,
) -> AnnualFiling {
    AnnualFiling {
        fiscal_year,
        filed: NaiveDate::from_ymd_opt(fiscal_year, 11, 1).unwrap(),
        income_statement,
        balance_sheet,
    }
}
