use std::collections::HashMap;

use watch_core::{AnalysisError, FilingProvider};

use crate::fields::{
    effective_tax_rate, extract_statement_value, INCOME_TAX_EXPENSE, PRETAX_INCOME,
};
use crate::model::{
    WaccAssumptions, WaccComponents, WaccResult, DEFAULT_BETA, DEFAULT_MARKET_RISK_PREMIUM,
    DEFAULT_RISK_FREE_RATE,
};

const SHORT_TERM_DEBT: &[&str] = &[
    "DebtCurrent",
    "us-gaap:DebtCurrent",
    "ShortTermBorrowings",
    "us-gaap:ShortTermBorrowings",
];

const LONG_TERM_DEBT: &[&str] = &[
    "LongTermDebt",
    "us-gaap:LongTermDebt",
    "LongTermDebtNoncurrent",
    "us-gaap:LongTermDebtNoncurrent",
];

const INTEREST_EXPENSE: &[&str] = &[
    "InterestExpense",
    "us-gaap:InterestExpense",
    "InterestExpenseDebt",
    "us-gaap:InterestExpenseDebt",
];

const STOCKHOLDERS_EQUITY: &[&str] = &[
    "StockholdersEquity",
    "us-gaap:StockholdersEquity",
    "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
    "us-gaap:StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
];

const DEFAULT_COST_OF_DEBT: f64 = 0.05;

/// Sensitivity shift applied to the risk-free rate, in absolute terms (100bp)
const RISK_FREE_SHIFT: f64 = 0.01;

/// Extract WACC components from a ticker's latest annual filing.
///
/// Book equity is mandatory and must be positive; everything else clamps to
/// a default rather than failing, favoring an approximate WACC over a hard
/// error.
pub async fn extract_wacc_components<P: FilingProvider + ?Sized>(
    provider: &P,
    ticker: &str,
    assumptions: &WaccAssumptions,
) -> Result<WaccComponents, AnalysisError> {
    let filing = provider
        .latest_annual_filing(ticker)
        .await?
        .ok_or_else(|| AnalysisError::FinancialData(format!("No 10-K filing found for {ticker}")))?;

    if filing.income_statement.is_empty() || filing.balance_sheet.is_empty() {
        return Err(AnalysisError::FinancialData(format!(
            "Missing financial statements for {ticker}"
        )));
    }

    let income_stmt = &filing.income_statement;
    let balance_sheet = &filing.balance_sheet;

    let short_term_debt = extract_statement_value(balance_sheet, SHORT_TERM_DEBT).unwrap_or(0.0);
    let long_term_debt = extract_statement_value(balance_sheet, LONG_TERM_DEBT).unwrap_or(0.0);
    let total_debt = short_term_debt + long_term_debt;

    let interest_expense = extract_statement_value(income_stmt, INTEREST_EXPENSE);
    let cost_of_debt = derive_cost_of_debt(interest_expense, total_debt);

    let total_equity = match extract_statement_value(balance_sheet, STOCKHOLDERS_EQUITY) {
        Some(equity) if equity > 0.0 => equity,
        _ => {
            return Err(AnalysisError::FinancialData(format!(
                "Invalid stockholders equity for {ticker}"
            )))
        }
    };

    let tax_expense = extract_statement_value(income_stmt, INCOME_TAX_EXPENSE);
    let pretax_income = extract_statement_value(income_stmt, PRETAX_INCOME);
    let tax_rate = effective_tax_rate(tax_expense, pretax_income);

    let total_capital = total_equity + total_debt;
    if total_capital <= 0.0 {
        return Err(AnalysisError::FinancialData(format!(
            "Invalid total capital for {ticker}"
        )));
    }
    let equity_ratio = total_equity / total_capital;
    let debt_ratio = total_debt / total_capital;

    let risk_free_rate = assumptions.risk_free_rate.unwrap_or(DEFAULT_RISK_FREE_RATE);
    let market_risk_premium = assumptions
        .market_risk_premium
        .unwrap_or(DEFAULT_MARKET_RISK_PREMIUM);
    let beta = assumptions.beta.unwrap_or(DEFAULT_BETA);

    // CAPM
    let cost_of_equity = risk_free_rate + beta * market_risk_premium;

    Ok(WaccComponents {
        cost_of_equity,
        cost_of_debt,
        tax_rate,
        equity_ratio,
        debt_ratio,
        total_equity,
        total_debt,
        risk_free_rate,
        beta,
        market_risk_premium,
    })
}

/// `|interest| / debt`, defaulting to 5% when debt or interest is absent or
/// the raw ratio lands outside [0, 0.20]. Out-of-range computations take the
/// default, not the nearest boundary.
fn derive_cost_of_debt(interest_expense: Option<f64>, total_debt: f64) -> f64 {
    let Some(interest) = interest_expense else {
        return DEFAULT_COST_OF_DEBT;
    };
    if interest == 0.0 || total_debt <= 0.0 {
        return DEFAULT_COST_OF_DEBT;
    }
    let rate = interest.abs() / total_debt;
    if (0.0..=0.20).contains(&rate) {
        rate
    } else {
        DEFAULT_COST_OF_DEBT
    }
}

/// Combine components into a weighted cost of capital:
/// `WACC = E/V × Re + D/V × Rd × (1 − Tc)`.
///
/// With `sensitivity`, cost of equity is recomputed at ±100bp on the
/// risk-free rate (optimistic floored at zero) with the same weights, so
/// pessimistic ≥ base ≥ optimistic holds for non-negative beta and premium.
pub fn wacc_from_components(components: WaccComponents, sensitivity: bool) -> WaccResult {
    let after_tax_debt =
        components.debt_ratio * components.cost_of_debt * (1.0 - components.tax_rate);
    let baseline = components.equity_ratio * components.cost_of_equity + after_tax_debt;

    let mut scenarios = HashMap::new();
    scenarios.insert("base".to_string(), baseline);

    if sensitivity {
        let pessimistic_re = (components.risk_free_rate + RISK_FREE_SHIFT)
            + components.beta * components.market_risk_premium;
        scenarios.insert(
            "pessimistic".to_string(),
            components.equity_ratio * pessimistic_re + after_tax_debt,
        );

        let optimistic_rf = (components.risk_free_rate - RISK_FREE_SHIFT).max(0.0);
        let optimistic_re = optimistic_rf + components.beta * components.market_risk_premium;
        scenarios.insert(
            "optimistic".to_string(),
            components.equity_ratio * optimistic_re + after_tax_debt,
        );
    }

    WaccResult {
        baseline,
        scenarios,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{filing, statement_rows, provider_with};

    fn components(
        cost_of_equity: f64,
        cost_of_debt: f64,
        tax_rate: f64,
        equity_ratio: f64,
        debt_ratio: f64,
    ) -> WaccComponents {
        WaccComponents {
            cost_of_equity,
            cost_of_debt,
            tax_rate,
            equity_ratio,
            debt_ratio,
            total_equity: equity_ratio * 1000.0,
            total_debt: debt_ratio * 1000.0,
            risk_free_rate: 0.04,
            beta: 1.0,
            market_risk_premium: 0.055,
        }
    }

    fn wacc_filing() -> watch_core::AnnualFiling {
        filing(
            2024,
            statement_rows(&[
                ("InterestExpense", 4.0),
                ("IncomeTaxExpenseBenefit", 21.0),
                (
                    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
                    100.0,
                ),
            ]),
            statement_rows(&[
                ("DebtCurrent", 20.0),
                ("LongTermDebt", 80.0),
                ("StockholdersEquity", 400.0),
            ]),
        )
    }

    #[test]
    fn baseline_formula_is_exact() {
        let result = wacc_from_components(components(0.10, 0.05, 0.21, 0.70, 0.30), false);
        assert!((result.baseline - 0.08185).abs() < 1e-4);
        assert_eq!(result.scenarios.len(), 1);
        assert!(result.scenarios.contains_key("base"));
    }

    #[test]
    fn sensitivity_scenarios_are_monotonic() {
        let result = wacc_from_components(components(0.095, 0.04, 0.25, 0.6, 0.4), true);
        let base = result.scenarios["base"];
        let pessimistic = result.scenarios["pessimistic"];
        let optimistic = result.scenarios["optimistic"];
        assert!(pessimistic >= base, "{pessimistic} < {base}");
        assert!(base >= optimistic, "{base} < {optimistic}");
        assert_eq!(base, result.baseline);
    }

    #[test]
    fn optimistic_risk_free_rate_floors_at_zero() {
        let mut c = components(0.06, 0.05, 0.21, 0.8, 0.2);
        c.risk_free_rate = 0.005;
        let result = wacc_from_components(c.clone(), true);
        // Floored rf of 0 rather than -0.5%.
        let expected_re = 0.0 + c.beta * c.market_risk_premium;
        let expected = c.equity_ratio * expected_re
            + c.debt_ratio * c.cost_of_debt * (1.0 - c.tax_rate);
        assert!((result.scenarios["optimistic"] - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn extracts_components_from_latest_filing() {
        let provider = provider_with(vec![wacc_filing()]);
        let c = extract_wacc_components(&provider, "AAPL", &WaccAssumptions::default())
            .await
            .unwrap();

        assert!((c.total_debt - 100.0).abs() < 1e-9);
        assert!((c.cost_of_debt - 0.04).abs() < 1e-9);
        assert!((c.equity_ratio - 0.8).abs() < 1e-9);
        assert!((c.debt_ratio - 0.2).abs() < 1e-9);
        assert!((c.equity_ratio + c.debt_ratio - 1.0).abs() < 1e-6);
        // CAPM with the fixed defaults: 4.0% + 1.0 × 5.5%.
        assert!((c.cost_of_equity - 0.095).abs() < 1e-9);
        assert!((c.tax_rate - 0.21).abs() < 1e-9);
    }

    #[tokio::test]
    async fn overrides_replace_capm_defaults_independently() {
        let provider = provider_with(vec![wacc_filing()]);
        let assumptions = WaccAssumptions {
            beta: Some(1.2),
            ..Default::default()
        };
        let c = extract_wacc_components(&provider, "AAPL", &assumptions)
            .await
            .unwrap();
        assert!((c.beta - 1.2).abs() < 1e-9);
        assert!((c.risk_free_rate - DEFAULT_RISK_FREE_RATE).abs() < 1e-9);
        assert!((c.cost_of_equity - (0.04 + 1.2 * 0.055)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn out_of_range_cost_of_debt_takes_default() {
        let mut f = wacc_filing();
        // 50 interest on 100 debt => 50%, outside [0, 20%].
        f.income_statement = statement_rows(&[("InterestExpense", 50.0)]);
        let provider = provider_with(vec![f]);
        let c = extract_wacc_components(&provider, "AAPL", &WaccAssumptions::default())
            .await
            .unwrap();
        assert!((c.cost_of_debt - 0.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn zero_debt_defaults_cost_of_debt() {
        let mut f = wacc_filing();
        f.balance_sheet = statement_rows(&[("StockholdersEquity", 400.0)]);
        let provider = provider_with(vec![f]);
        let c = extract_wacc_components(&provider, "AAPL", &WaccAssumptions::default())
            .await
            .unwrap();
        assert!((c.cost_of_debt - 0.05).abs() < 1e-9);
        assert!((c.equity_ratio - 1.0).abs() < 1e-9);
        assert!((c.debt_ratio).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_equity_is_a_hard_failure() {
        let mut f = wacc_filing();
        f.balance_sheet = statement_rows(&[("DebtCurrent", 20.0), ("LongTermDebt", 80.0)]);
        let provider = provider_with(vec![f]);
        let err = extract_wacc_components(&provider, "AAPL", &WaccAssumptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::FinancialData(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn non_positive_equity_is_a_hard_failure() {
        let mut f = wacc_filing();
        f.balance_sheet = statement_rows(&[("StockholdersEquity", -5.0), ("LongTermDebt", 80.0)]);
        let provider = provider_with(vec![f]);
        let err = extract_wacc_components(&provider, "AAPL", &WaccAssumptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::FinancialData(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn no_annual_filing_is_a_financial_data_error() {
        let provider = provider_with(vec![]);
        let err = extract_wacc_components(&provider, "AAPL", &WaccAssumptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::FinancialData(_)), "got {err:?}");
    }
}
