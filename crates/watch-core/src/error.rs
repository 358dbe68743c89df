use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Financial data error: {0}")]
    FinancialData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AnalysisError {
    /// True for the recoverable "company exists but history is thin" case.
    /// Callers iterating a watchlist skip these tickers instead of failing.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, AnalysisError::InsufficientData(_))
    }
}
