//! Relevance scoring of SEC filings against a price-drop date, from filing
//! type and recency.

use chrono::NaiveDate;
use watch_core::Filing;

/// Base relevance by form type; current-event forms score highest
const FORM_TYPE_BASE_SCORES: &[(&str, f64)] = &[
    ("8-K", 0.9),
    ("10-Q", 0.6),
    ("10-K", 0.3),
    ("4", 0.4),
    ("6-K", 0.7),
    ("8-A", 0.2),
];
const DEFAULT_BASE_SCORE: f64 = 0.2;

/// Relevance lost per day between filing date and drop date
const TIME_DECAY_RATES: &[(&str, f64)] = &[
    ("8-K", 0.05),
    ("10-Q", 0.03),
    ("10-K", 0.01),
    ("4", 0.04),
    ("6-K", 0.05),
];
const DEFAULT_DECAY_RATE: f64 = 0.02;

/// Filing plus its relevance to a specific drop date
#[derive(Debug, Clone)]
pub struct ScoredFiling {
    pub filing: Filing,
    pub relevance_score: f64,
}

fn lookup(table: &[(&str, f64)], form_type: &str, default: f64) -> f64 {
    table
        .iter()
        .find(|(form, _)| *form == form_type)
        .map_or(default, |(_, score)| *score)
}

/// Score how relevant a filing is to a price drop, in [0, 1].
///
/// Fixed scores cover the headline cases (a same-day 8-K is almost
/// certainly the story); everything else starts from the form-type base
/// score and decays per day of distance from the drop.
pub fn score_filing_relevance(filing: &Filing, drop_date: NaiveDate) -> f64 {
    let form_type = filing.form_type.to_uppercase();
    let days_diff = (drop_date - filing.filed_date).num_days().abs();

    match (form_type.as_str(), days_diff) {
        ("8-K", 0) => return 0.95,
        ("8-K", 1) => return 0.85,
        ("10-Q", d) if d <= 7 => return 0.65,
        ("10-Q", d) if d <= 14 => return 0.45,
        ("10-K", d) if d <= 30 => return 0.30,
        _ => {}
    }

    let base = lookup(FORM_TYPE_BASE_SCORES, &form_type, DEFAULT_BASE_SCORE);
    let decay = lookup(TIME_DECAY_RATES, &form_type, DEFAULT_DECAY_RATE);
    (base - days_diff as f64 * decay).clamp(0.0, 1.0)
}

/// Rank filings by relevance, highest first. The sort is stable, so equal
/// scores keep their input order.
pub fn rank_filings_by_relevance(filings: &[Filing], drop_date: NaiveDate) -> Vec<ScoredFiling> {
    let mut scored: Vec<ScoredFiling> = filings
        .iter()
        .map(|filing| ScoredFiling {
            filing: filing.clone(),
            relevance_score: score_filing_relevance(filing, drop_date),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

/// Top `n` most relevant filings for a drop date.
pub fn top_relevant_filings(
    filings: &[Filing],
    drop_date: NaiveDate,
    n: usize,
) -> Vec<ScoredFiling> {
    let mut ranked = rank_filings_by_relevance(filings, drop_date);
    ranked.truncate(n);
    ranked
}

/// Human-readable relevance label for dashboard display.
pub fn relevance_label(score: f64) -> &'static str {
    if score >= 0.8 {
        "Strongly related"
    } else if score >= 0.6 {
        "Likely related"
    } else if score >= 0.4 {
        "Possibly related"
    } else if score >= 0.2 {
        "Probably unrelated"
    } else {
        "Unlikely related"
    }
}
