use watch_core::FinancialStatement;

/// Income tax expense aliases, shared by the ROIC and WACC extractors
pub(crate) const INCOME_TAX_EXPENSE: &[&str] =
    &["IncomeTaxExpenseBenefit", "us-gaap:IncomeTaxExpenseBenefit"];

/// Pre-tax continuing-operations income aliases
pub(crate) const PRETAX_INCOME: &[&str] = &[
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
    "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
];

/// US federal statutory corporate tax rate, the fallback whenever an
/// effective rate cannot be derived
pub(crate) const DEFAULT_TAX_RATE: f64 = 0.21;

/// Namespace-prefixed and underscore spellings of the same tag compare
/// equal ("us-gaap:Assets" matches "us-gaap_Assets").
fn normalize_concept(concept: &str) -> String {
    concept.replace(':', "_")
}

/// Resolve a named accounting concept out of a tabular statement by trying
/// `candidates` in order. For the first candidate with a matching row, the
/// most recent period column holding a finite number wins; a matched row
/// with no numeric column falls through to the next candidate.
///
/// Returns `None` when nothing matches. Different filers tag the same
/// quantity under different vocabularies, so absence is an expected,
/// common condition, not an error.
pub fn extract_statement_value(statement: &FinancialStatement, candidates: &[&str]) -> Option<f64> {
    for candidate in candidates {
        let wanted = normalize_concept(candidate);
        let row = statement
            .rows
            .iter()
            .find(|r| normalize_concept(&r.concept) == wanted);

        if let Some(row) = row {
            // Columns are ordered most recent period first.
            for value in row.values.iter().flatten() {
                if value.is_finite() {
                    return Some(*value);
                }
            }
        }
    }
    None
}

/// Effective tax rate `|tax / pretax|`, clamped to the statutory default
/// when either input is missing or zero, or when the ratio lands outside
/// [0, 0.5]. Extreme or negative effective rates are treated as data
/// artifacts, not real tax policy.
pub(crate) fn effective_tax_rate(tax_expense: Option<f64>, pretax_income: Option<f64>) -> f64 {
    let (Some(tax), Some(pretax)) = (tax_expense, pretax_income) else {
        return DEFAULT_TAX_RATE;
    };
    if tax == 0.0 || pretax == 0.0 {
        return DEFAULT_TAX_RATE;
    }
    let rate = (tax / pretax).abs();
    if (0.0..=0.5).contains(&rate) {
        rate
    } else {
        DEFAULT_TAX_RATE
    }
}
