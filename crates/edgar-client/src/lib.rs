//! SEC EDGAR client: ticker-to-CIK resolution, annual-filing statements from
//! the XBRL company-facts API, and recent-filings listings for alert
//! enrichment.
//!
//! SEC fair-access policy: at most 10 requests per second, and every request
//! must carry a User-Agent identifying the caller. The identity is a
//! constructor argument threaded into each request, never ambient process
//! state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use watch_core::{AnalysisError, AnnualFiling, Filing, FilingProvider};

mod facts;

use facts::{annual_filings_from_facts, CompanyFacts};

const DATA_BASE_URL: &str = "https://data.sec.gov";
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// SEC fair-access limit: 10 requests per second
const MAX_REQUESTS_PER_SECOND: usize = 10;

/// Sliding-window limiter keeping within the SEC request quota.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let Some(wait_until) = ts.front().and_then(|f| f.checked_add(self.window)) else {
                return;
            };
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(10);
            drop(ts);
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Client for SEC EDGAR company data.
#[derive(Clone)]
pub struct EdgarClient {
    identity: String,
    client: Client,
    rate_limiter: RateLimiter,
    cik_map: Arc<Mutex<Option<HashMap<String, u64>>>>,
}

impl EdgarClient {
    /// Create a client with the caller identity required by SEC fair-access
    /// policy (e.g. `"Spreadwatch admin@example.com"`).
    pub fn new(identity: impl Into<String>) -> Result<Self, AnalysisError> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(AnalysisError::ConfigError(
                "SEC EDGAR identity (User-Agent) must be set before any filing request".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            identity,
            client,
            rate_limiter: RateLimiter::new(MAX_REQUESTS_PER_SECOND, Duration::from_secs(1)),
            cik_map: Arc::new(Mutex::new(None)),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, AnalysisError> {
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.identity)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            // SEC rejects requests whose identity it does not accept.
            return Err(AnalysisError::FinancialData(format!(
                "SEC EDGAR rejected the request (HTTP {status}); check the configured identity"
            )));
        }
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }

    /// Resolve a ticker to its zero-padded CIK. The ticker map is fetched
    /// once per client and held in memory.
    pub async fn cik_for(&self, ticker: &str) -> Result<u64, AnalysisError> {
        let mut cached = self.cik_map.lock().await;

        if cached.is_none() {
            let raw: HashMap<String, TickerEntry> = self.get_json(COMPANY_TICKERS_URL).await?;
            let map = raw
                .into_values()
                .map(|entry| (entry.ticker.to_uppercase(), entry.cik_str))
                .collect();
            *cached = Some(map);
            debug!("loaded SEC ticker-to-CIK map");
        }

        cached
            .as_ref()
            .and_then(|map| map.get(&ticker.to_uppercase()).copied())
            .ok_or_else(|| {
                AnalysisError::FinancialData(format!("No company found for ticker {ticker}"))
            })
    }

    async fn company_facts(&self, cik: u64) -> Result<CompanyFacts, AnalysisError> {
        let url = format!("{DATA_BASE_URL}/api/xbrl/companyfacts/CIK{cik:010}.json");
        self.get_json(&url).await
    }

    /// Recent filings of the given form types filed within `days_back` days.
    pub async fn get_recent_filings(
        &self,
        ticker: &str,
        days_back: i64,
        form_types: &[&str],
    ) -> Result<Vec<Filing>, AnalysisError> {
        let cik = self.cik_for(ticker).await?;
        let url = format!("{DATA_BASE_URL}/submissions/CIK{cik:010}.json");
        let submissions: Submissions = self.get_json(&url).await?;

        let cutoff = Utc::now().date_naive() - chrono::Duration::days(days_back);
        let filings = collect_recent_filings(&submissions.filings.recent, cik, cutoff, form_types);

        info!(ticker, count = filings.len(), "fetched recent filings");
        Ok(filings)
    }
}

/// Filter the submissions index down to [`Filing`] records within the
/// look-back window.
fn collect_recent_filings(
    recent: &RecentFilings,
    cik: u64,
    cutoff: NaiveDate,
    form_types: &[&str],
) -> Vec<Filing> {
    let wanted: Vec<String> = form_types.iter().map(|f| f.to_uppercase()).collect();
    let mut filings = Vec::new();

    for (i, form) in recent.form.iter().enumerate() {
        if !wanted.iter().any(|w| w == &form.to_uppercase()) {
            continue;
        }

        let Some(filed_date) = recent
            .filing_date
            .get(i)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if filed_date < cutoff {
            continue;
        }

        let document = recent.primary_document.get(i).cloned().unwrap_or_default();
        let accession = recent
            .accession_number
            .get(i)
            .map(|a| a.replace('-', ""))
            .unwrap_or_default();

        let summary = recent
            .primary_doc_description
            .get(i)
            .filter(|d| !d.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("{form} filed on {filed_date}"));

        filings.push(Filing {
            form_type: form.clone(),
            filed_date,
            summary,
            url: format!("https://www.sec.gov/Archives/edgar/data/{cik}/{accession}/{document}"),
        });
    }

    filings
}

#[async_trait]
impl FilingProvider for EdgarClient {
    async fn latest_annual_filing(
        &self,
        ticker: &str,
    ) -> Result<Option<AnnualFiling>, AnalysisError> {
        Ok(self.annual_filings(ticker, 1).await?.into_iter().next())
    }

    async fn annual_filings(
        &self,
        ticker: &str,
        count: usize,
    ) -> Result<Vec<AnnualFiling>, AnalysisError> {
        let cik = self.cik_for(ticker).await?;
        let facts = self.company_facts(cik).await?;

        let by_year = annual_filings_from_facts(&facts);
        if by_year.is_empty() {
            warn!(ticker, "no annual report facts available");
        }

        // Most recent first; the analysis layer re-sorts ascending itself.
        Ok(by_year.into_values().rev().take(count).collect())
    }

    async fn recent_filings(
        &self,
        ticker: &str,
        days_back: i64,
        form_types: &[&str],
    ) -> Result<Vec<Filing>, AnalysisError> {
        self.get_recent_filings(ticker, days_back, form_types).await
    }
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    cik_str: u64,
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    recent: RecentFilings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
    #[serde(default)]
    primary_doc_description: Vec<String>,
}
