//! Orchestration of the ticker monitor: config loading, the per-ticker
//! pipeline (prices → alert → enrichment → spread), and artifact
//! persistence.

pub mod config;
pub mod pipeline;

pub use config::WatchConfig;
pub use pipeline::{
    PipelineSummary, WatchPipeline, ALERT_FORM_TYPES, FILING_LOOKBACK_DAYS, PRICE_WINDOW_DAYS,
};
