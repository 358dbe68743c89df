use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Single adjusted daily close for a ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Persisted price window for a ticker, consumed by the alert check
/// and committed as a dashboard artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesState {
    pub timestamp: DateTime<Utc>,
    pub prices: Vec<DailyClose>,
    pub last_fetch_timestamp: Option<DateTime<Utc>>,
}

impl PricesState {
    pub fn new(prices: Vec<DailyClose>) -> Self {
        let now = Utc::now();
        Self {
            timestamp: now,
            prices,
            last_fetch_timestamp: Some(now),
        }
    }
}

/// Result of the week-over-week price drop check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub alert_triggered: bool,
    pub price_first_close: f64,
    pub price_last_close: f64,
    pub drop_percentage: f64,
    pub reason: String,
    /// Relevant SEC filings appended once the alert has been enriched.
    /// Always present in the artifact, empty when nothing was found.
    #[serde(default)]
    pub filing_context: Vec<FilingContext>,
}

/// Raw filing record from the regulatory data provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filing {
    pub form_type: String,
    pub filed_date: NaiveDate,
    pub summary: String,
    pub url: String,
}

/// Scored and summarized filing attached to a triggered alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingContext {
    pub form_type: String,
    pub filed_date: NaiveDate,
    pub key_points: Vec<String>,
    pub summary: String,
    pub url: String,
    pub relevance_score: f64,
}

/// Tabular financial statement: rows are accounting concepts, columns are
/// reporting periods. `values` in each row line up with `periods`, most
/// recent period first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub periods: Vec<String>,
    pub rows: Vec<StatementRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRow {
    pub concept: String,
    pub values: Vec<Option<f64>>,
}

impl FinancialStatement {
    pub fn push_row(&mut self, concept: impl Into<String>, values: Vec<Option<f64>>) {
        self.rows.push(StatementRow {
            concept: concept.into(),
            values,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One annual (10-K) filing with its extracted statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualFiling {
    pub fiscal_year: i32,
    pub filed: NaiveDate,
    pub income_statement: FinancialStatement,
    pub balance_sheet: FinancialStatement,
}
