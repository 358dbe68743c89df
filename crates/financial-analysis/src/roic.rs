use tracing::{debug, warn};
use watch_core::{AnalysisError, AnnualFiling, FilingProvider};

use crate::fields::{
    effective_tax_rate, extract_statement_value, INCOME_TAX_EXPENSE, PRETAX_INCOME,
};
use crate::model::{RoicHistory, RoicRecord};

const OPERATING_INCOME: &[&str] = &[
    "OperatingIncomeLoss",
    "us-gaap:OperatingIncomeLoss",
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
    "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
];

const TOTAL_ASSETS: &[&str] = &["Assets", "us-gaap:Assets"];

const CASH_AND_EQUIVALENTS: &[&str] = &[
    "CashAndCashEquivalentsAtCarryingValue",
    "us-gaap:CashAndCashEquivalentsAtCarryingValue",
    "Cash",
    "us-gaap:Cash",
];

const CURRENT_LIABILITIES: &[&str] = &["LiabilitiesCurrent", "us-gaap:LiabilitiesCurrent"];

const SHORT_TERM_DEBT: &[&str] = &[
    "ShortTermBorrowings",
    "us-gaap:ShortTermBorrowings",
    "DebtCurrent",
    "us-gaap:DebtCurrent",
];

/// Minimum fiscal years required for a usable ROIC history
pub const MIN_ROIC_YEARS: usize = 3;

/// Extract historical ROIC for a ticker from its most recent annual filings.
///
/// Per year: `NOPAT = operating income × (1 − effective tax rate)` and
/// `invested capital = total assets − cash − max(0, current liabilities −
/// short-term debt)`. Years missing a mandatory figure or with non-positive
/// invested capital are skipped with a warning, not errors; the result is
/// sorted ascending by year.
///
/// Fails with `InsufficientData` when fewer than [`MIN_ROIC_YEARS`] usable
/// years remain. Provider failures (unknown company) pass through as
/// `FinancialData` errors so callers can tell the two apart.
pub async fn extract_roic_history<P: FilingProvider + ?Sized>(
    provider: &P,
    ticker: &str,
    years: usize,
) -> Result<RoicHistory, AnalysisError> {
    let filings = provider.annual_filings(ticker, years).await?;

    if filings.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "No 10-K filings found for {ticker}"
        )));
    }

    let mut records: Vec<RoicRecord> = Vec::with_capacity(filings.len());
    for filing in &filings {
        if let Some(record) = roic_record(ticker, filing) {
            debug!(
                ticker,
                year = record.year,
                roic = format!("{:.2}%", record.roic * 100.0),
                "extracted ROIC"
            );
            records.push(record);
        }
    }

    if records.len() < MIN_ROIC_YEARS {
        return Err(AnalysisError::InsufficientData(format!(
            "Insufficient ROIC data for {ticker}: only {} years available (need at least {MIN_ROIC_YEARS})",
            records.len()
        )));
    }

    records.sort_by_key(|r| r.year);
    Ok(RoicHistory { records })
}

/// One fiscal year's ROIC record, or `None` when the filing is missing a
/// mandatory figure or invested capital is non-positive.
fn roic_record(ticker: &str, filing: &AnnualFiling) -> Option<RoicRecord> {
    let year = filing.fiscal_year;

    if filing.income_statement.is_empty() || filing.balance_sheet.is_empty() {
        warn!(ticker, year, "missing financial statements, skipping fiscal year");
        return None;
    }

    let Some(operating_income) = extract_statement_value(&filing.income_statement, OPERATING_INCOME)
    else {
        warn!(ticker, year, "no operating income found, skipping fiscal year");
        return None;
    };

    let tax_expense = extract_statement_value(&filing.income_statement, INCOME_TAX_EXPENSE);
    let pretax_income = extract_statement_value(&filing.income_statement, PRETAX_INCOME);
    let tax_rate = effective_tax_rate(tax_expense, pretax_income);
    let nopat = operating_income * (1.0 - tax_rate);

    let Some(total_assets) = extract_statement_value(&filing.balance_sheet, TOTAL_ASSETS) else {
        warn!(ticker, year, "no total assets found, skipping fiscal year");
        return None;
    };

    let cash =
        extract_statement_value(&filing.balance_sheet, CASH_AND_EQUIVALENTS).unwrap_or(0.0);
    let current_liabilities =
        extract_statement_value(&filing.balance_sheet, CURRENT_LIABILITIES).unwrap_or(0.0);
    let short_term_debt =
        extract_statement_value(&filing.balance_sheet, SHORT_TERM_DEBT).unwrap_or(0.0);

    let non_interest_liabilities = (current_liabilities - short_term_debt).max(0.0);
    let invested_capital = total_assets - cash - non_interest_liabilities;

    if invested_capital <= 0.0 {
        warn!(
            ticker,
            year, invested_capital, "invalid invested capital, skipping fiscal year"
        );
        return None;
    }

    Some(RoicRecord {
        year,
        roic: nopat / invested_capital,
        nopat,
        invested_capital,
    })
}
