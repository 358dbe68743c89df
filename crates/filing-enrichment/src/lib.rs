//! Enrichment of triggered price alerts with contextually relevant SEC
//! filings: relevance scoring, key-point summarization, context assembly.

pub mod scorer;
pub mod summarizer;

pub use scorer::{
    rank_filings_by_relevance, relevance_label, score_filing_relevance, top_relevant_filings,
    ScoredFiling,
};
pub use summarizer::{clean_summary, create_filing_summary, extract_key_points};

use chrono::NaiveDate;
use tracing::info;
use watch_core::{Filing, FilingContext};

/// Number of filings attached to an alert by default
pub const DEFAULT_CONTEXT_SIZE: usize = 3;

/// Build the filing context for a triggered alert: score every filing
/// against the drop date, keep the top `n`, and summarize each. An empty
/// input yields an empty context, which is still written to the alert for
/// consistency.
pub fn build_filing_context(
    filings: &[Filing],
    drop_date: NaiveDate,
    n: usize,
) -> Vec<FilingContext> {
    let context: Vec<FilingContext> = top_relevant_filings(filings, drop_date, n)
        .iter()
        .map(create_filing_summary)
        .collect();

    info!(
        candidates = filings.len(),
        selected = context.len(),
        "built filing context"
    );
    context
}
