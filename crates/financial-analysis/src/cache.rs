use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{RoicHistory, SpreadResult, WaccComponents};

/// Cached sub-results older than this are treated as absent on read
pub const CACHE_MAX_AGE_DAYS: i64 = 90;

/// Per-ticker persisted record. Sub-results are independently cacheable;
/// the whole record carries one `cache_date`, re-stamped on every merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedFinancials {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub cache_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roic_history: Option<RoicHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacc_components: Option<WaccComponents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_result: Option<SpreadResult>,
}

/// On-disk memo of extraction results, one JSON file per ticker.
///
/// The cache is a pure optimization: unreadable or corrupt files load as a
/// miss and failed writes only log. Extraction correctness never depends on
/// cache presence. No locking; at most one process is expected to operate
/// on a given ticker's file at a time.
#[derive(Debug, Clone)]
pub struct FinancialCache {
    data_dir: PathBuf,
}

impl FinancialCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("financial_cache_{ticker}.json"))
    }

    /// Load a ticker's record, treating anything older than
    /// [`CACHE_MAX_AGE_DAYS`] as absent.
    pub fn load(&self, ticker: &str) -> Option<CachedFinancials> {
        let record = self.load_unchecked(ticker)?;
        let cache_date = record.cache_date?;
        let days_old = (Utc::now() - cache_date).num_days();

        if days_old < CACHE_MAX_AGE_DAYS {
            debug!(ticker, days_old, "loaded cached financial data");
            Some(record)
        } else {
            info!(ticker, days_old, "financial cache is stale, refreshing");
            None
        }
    }

    pub fn store_roic_history(&self, ticker: &str, roic: &RoicHistory) {
        self.merge(ticker, |record| record.roic_history = Some(roic.clone()));
    }

    pub fn store_wacc_components(&self, ticker: &str, components: &WaccComponents) {
        self.merge(ticker, |record| {
            record.wacc_components = Some(components.clone())
        });
    }

    pub fn store_spread_result(&self, ticker: &str, spread: &SpreadResult) {
        self.merge(ticker, |record| record.spread_result = Some(spread.clone()));
    }

    /// Read-modify-write merge: refresh one sub-result without clobbering
    /// its siblings, stamp `cache_date`, persist the whole record.
    fn merge(&self, ticker: &str, update: impl FnOnce(&mut CachedFinancials)) {
        let mut record = self.load_unchecked(ticker).unwrap_or_default();
        update(&mut record);
        record.ticker = ticker.to_string();
        record.cache_date = Some(Utc::now());

        if let Err(e) = self.write(ticker, &record) {
            warn!(ticker, error = %e, "failed to save financial cache");
        }
    }

    /// Load without the staleness check, for use as a merge base.
    fn load_unchecked(&self, ticker: &str) -> Option<CachedFinancials> {
        let path = self.cache_path(ticker);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(ticker, error = %e, "failed to read financial cache");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(ticker, error = %e, "corrupt financial cache, treating as absent");
                None
            }
        }
    }

    fn write(&self, ticker: &str, record: &CachedFinancials) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.cache_path(ticker), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoicRecord;
    use chrono::Duration;

    fn sample_roic() -> RoicHistory {
        RoicHistory {
            records: vec![
                RoicRecord {
                    year: 2023,
                    roic: 0.18,
                    nopat: 90.0,
                    invested_capital: 500.0,
                },
                RoicRecord {
                    year: 2024,
                    roic: 0.20,
                    nopat: 100.0,
                    invested_capital: 500.0,
                },
            ],
        }
    }

    fn sample_components() -> WaccComponents {
        WaccComponents {
            cost_of_equity: 0.095,
            cost_of_debt: 0.04,
            tax_rate: 0.21,
            equity_ratio: 0.8,
            debt_ratio: 0.2,
            total_equity: 800.0,
            total_debt: 200.0,
            risk_free_rate: 0.04,
            beta: 1.0,
            market_risk_premium: 0.055,
        }
    }

    #[test]
    fn round_trip_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FinancialCache::new(dir.path());

        cache.store_roic_history("AAPL", &sample_roic());

        let loaded = cache.load("AAPL").expect("fresh cache should load");
        assert_eq!(loaded.ticker, "AAPL");
        assert_eq!(loaded.roic_history, Some(sample_roic()));
        assert!(loaded.wacc_components.is_none());
    }

    #[test]
    fn stale_cache_loads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FinancialCache::new(dir.path());

        cache.store_roic_history("AAPL", &sample_roic());

        // Backdate the stamp past the TTL.
        let mut record = cache.load("AAPL").unwrap();
        record.cache_date = Some(Utc::now() - Duration::days(CACHE_MAX_AGE_DAYS + 10));
        let json = serde_json::to_string_pretty(&record).unwrap();
        fs::write(cache.cache_path("AAPL"), json).unwrap();

        assert!(cache.load("AAPL").is_none());
    }

    #[test]
    fn merge_preserves_sibling_sub_results() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FinancialCache::new(dir.path());

        cache.store_roic_history("AAPL", &sample_roic());
        cache.store_wacc_components("AAPL", &sample_components());

        let loaded = cache.load("AAPL").unwrap();
        assert!(loaded.roic_history.is_some());
        assert!(loaded.wacc_components.is_some());
    }

    #[test]
    fn corrupt_file_is_a_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FinancialCache::new(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(cache.cache_path("AAPL"), "{not json").unwrap();

        assert!(cache.load("AAPL").is_none());

        // A corrupt merge base is replaced, not fatal.
        cache.store_roic_history("AAPL", &sample_roic());
        assert!(cache.load("AAPL").unwrap().roic_history.is_some());
    }

    #[test]
    fn missing_record_without_stamp_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FinancialCache::new(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(cache.cache_path("AAPL"), "{}").unwrap();

        assert!(cache.load("AAPL").is_none());
    }

    #[test]
    fn cache_files_are_per_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FinancialCache::new(dir.path());

        cache.store_roic_history("AAPL", &sample_roic());
        assert!(cache.load("MSFT").is_none());
        assert_eq!(
            cache.cache_path("MSFT").file_name().unwrap(),
            "financial_cache_MSFT.json"
        );
    }
}
