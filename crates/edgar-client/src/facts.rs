//! Assembly of per-fiscal-year financial statements from the SEC XBRL
//! company-facts payload.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Deserialize;
use watch_core::{AnnualFiling, FinancialStatement};

/// Company-facts payload: taxonomy -> concept -> reported facts
#[derive(Debug, Deserialize)]
pub(crate) struct CompanyFacts {
    #[serde(default)]
    pub facts: HashMap<String, HashMap<String, ConceptFacts>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConceptFacts {
    #[serde(default)]
    pub units: HashMap<String, Vec<FactEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FactEntry {
    /// Present for duration (flow) facts, absent for instant facts
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub val: Option<f64>,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub filed: Option<String>,
}

impl FactEntry {
    fn is_annual_report(&self) -> bool {
        self.form.as_deref() == Some("10-K") && self.fp.as_deref() == Some("FY")
    }
}

struct YearBuilder {
    income: Vec<(String, f64)>,
    balance: Vec<(String, f64)>,
    period_end: Option<String>,
    filed: Option<NaiveDate>,
}

impl YearBuilder {
    fn new() -> Self {
        Self {
            income: Vec::new(),
            balance: Vec::new(),
            period_end: None,
            filed: None,
        }
    }
}

/// Build one [`AnnualFiling`] per fiscal year from US-GAAP company facts,
/// keyed ascending by year.
///
/// Only USD facts reported on a 10-K for a full fiscal year are considered;
/// per concept and year, the entry with the latest period end wins (earlier
/// ends are prior-year comparatives restated in the same filing). Duration
/// facts land on the income statement, instant facts on the balance sheet.
pub(crate) fn annual_filings_from_facts(facts: &CompanyFacts) -> BTreeMap<i32, AnnualFiling> {
    let mut years: BTreeMap<i32, YearBuilder> = BTreeMap::new();

    let Some(gaap) = facts.facts.get("us-gaap") else {
        return BTreeMap::new();
    };

    for (concept, concept_facts) in gaap {
        let Some(entries) = concept_facts.units.get("USD") else {
            continue;
        };

        // Best (latest-ending) annual entry per fiscal year for this concept.
        let mut best: HashMap<i32, &FactEntry> = HashMap::new();
        for entry in entries {
            if !entry.is_annual_report() {
                continue;
            }
            let (Some(fy), Some(_)) = (entry.fy, entry.val) else {
                continue;
            };
            match best.get(&fy) {
                Some(current) if current.end >= entry.end => {}
                _ => {
                    best.insert(fy, entry);
                }
            }
        }

        for (fy, entry) in best {
            let builder = years.entry(fy).or_insert_with(YearBuilder::new);
            let value = entry.val.unwrap_or_default();

            if entry.start.is_some() {
                builder.income.push((concept.clone(), value));
            } else {
                builder.balance.push((concept.clone(), value));
            }

            if entry.end > builder.period_end {
                builder.period_end = entry.end.clone();
            }
            if let Some(filed) = entry
                .filed
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            {
                if builder.filed.map_or(true, |current| filed > current) {
                    builder.filed = Some(filed);
                }
            }
        }
    }

    years
        .into_iter()
        .filter_map(|(fy, builder)| {
            let period = builder.period_end?;
            let filed = builder
                .filed
                .or_else(|| NaiveDate::parse_from_str(&period, "%Y-%m-%d").ok())?;

            Some((
                fy,
                AnnualFiling {
                    fiscal_year: fy,
                    filed,
                    income_statement: statement_from_rows(&period, builder.income),
                    balance_sheet: statement_from_rows(&period, builder.balance),
                },
            ))
        })
        .collect()
}

fn statement_from_rows(period: &str, mut rows: Vec<(String, f64)>) -> FinancialStatement {
    // Deterministic row order for artifact stability.
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut statement = FinancialStatement {
        periods: vec![period.to_string()],
        rows: Vec::new(),
    };
    for (concept, value) in rows {
        statement.push_row(concept, vec![Some(value)]);
    }
    statement
}
