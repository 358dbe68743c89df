//! Key-point extraction and display cleanup for filing summaries.

use regex::Regex;
use watch_core::{Filing, FilingContext};

use crate::scorer::ScoredFiling;

/// Phrase categories that flag price-moving events in filing text
const KEY_PHRASE_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Officer changes",
        &[
            "officer",
            "departure",
            "resignation",
            "appointment",
            "termination",
            "executive",
            "management",
            "leadership",
            "board",
            "director",
        ],
    ),
    (
        "Financial performance",
        &[
            "earnings",
            "revenue",
            "profit",
            "loss",
            "guidance",
            "forecast",
            "outlook",
            "warning",
            "miss",
            "beat",
            "exceed",
            "fall short",
        ],
    ),
    (
        "Corporate actions",
        &[
            "acquisition",
            "merger",
            "takeover",
            "buyout",
            "divestiture",
            "spin-off",
            "split",
            "reorganization",
            "restructuring",
        ],
    ),
    (
        "Dividend changes",
        &[
            "dividend",
            "distribution",
            "payout",
            "split",
            "suspension",
            "increase",
            "decrease",
            "cut",
            "eliminate",
        ],
    ),
    (
        "Legal/regulatory",
        &[
            "lawsuit",
            "litigation",
            "investigation",
            "regulatory",
            "compliance",
            "settlement",
            "fine",
            "penalty",
            "violation",
            "enforcement",
        ],
    ),
    (
        "Financing activities",
        &[
            "offering",
            "financing",
            "capital",
            "raise",
            "issue",
            "securities",
            "debt",
            "equity",
            "shares",
            "stock",
            "convertible",
        ],
    ),
];

/// Standalone words worth surfacing when no category caught them
const IMPORTANT_WORDS: &[&str] = &[
    "officer",
    "departure",
    "resignation",
    "acquisition",
    "merger",
    "dividend",
    "warning",
    "risk",
];

/// Submission-header boilerplate stripped from summaries before display
const BOILERPLATE_PATTERNS: &[&str] = &[
    r"(?i)SECURITIES AND EXCHANGE COMMISSION\s*",
    r"(?i)FORM [0-9A-K/-]+\s",
    r"(?i)ACCESSION NUMBER\S*\s*",
    r"(?i)PUBLIC DOCUMENT COUNT\S*\s*",
    r"(?i)CONFORMED SUBMISSION TYPE\S*\s*",
];

const MAX_KEY_POINTS: usize = 3;
const MAX_SUMMARY_LEN: usize = 200;

/// Extract up to three key points from a filing's summary text.
pub fn extract_key_points(filing: &Filing) -> Vec<String> {
    let summary = filing.summary.to_lowercase();
    if summary.trim().is_empty() {
        return Vec::new();
    }
    let form_type = filing.form_type.to_uppercase();

    let mut key_points: Vec<String> = Vec::new();
    for (category, phrases) in KEY_PHRASE_CATEGORIES {
        if phrases.iter().any(|phrase| summary.contains(phrase)) {
            key_points.push(key_point_label(category, &form_type));
        }
    }

    // Fall back to surfacing individual important words not already covered.
    for word in IMPORTANT_WORDS {
        if summary.contains(word) && !key_points.iter().any(|kp| kp.to_lowercase().contains(word)) {
            key_points.push(title_case(word));
        }
    }

    key_points.truncate(MAX_KEY_POINTS);
    key_points
}

/// Prefix the category with the form type where the pairing is telling
/// (events in an 8-K, results in a periodic report).
fn key_point_label(category: &str, form_type: &str) -> String {
    let event_category = matches!(category, "Officer changes" | "Corporate actions");
    let results_category = category == "Financial performance";

    if form_type == "8-K" && event_category {
        format!("8-K: {category}")
    } else if (form_type == "10-Q" || form_type == "10-K") && results_category {
        format!("{form_type}: {category}")
    } else {
        category.to_string()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Clean a raw summary for display: collapse whitespace, strip submission
/// boilerplate, truncate to a dashboard-friendly length.
pub fn clean_summary(summary: &str) -> String {
    if summary.trim().is_empty() {
        return "No summary available".to_string();
    }

    let mut cleaned = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    for pattern in BOILERPLATE_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            cleaned = re.replace_all(&cleaned, "").into_owned();
        }
    }
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return "No summary available".to_string();
    }

    if cleaned.chars().count() > MAX_SUMMARY_LEN {
        let truncated: String = cleaned.chars().take(MAX_SUMMARY_LEN - 3).collect();
        format!("{truncated}...")
    } else {
        cleaned.to_string()
    }
}

/// Structured context entry for a scored filing.
pub fn create_filing_summary(scored: &ScoredFiling) -> FilingContext {
    FilingContext {
        form_type: scored.filing.form_type.clone(),
        filed_date: scored.filing.filed_date,
        key_points: extract_key_points(&scored.filing),
        summary: clean_summary(&scored.filing.summary),
        url: scored.filing.url.clone(),
        relevance_score: scored.relevance_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn filing(form_type: &str, summary: &str) -> Filing {
        Filing {
            form_type: form_type.to_string(),
            filed_date: NaiveDate::from_ymd_opt(2025, 7, 30).unwrap(),
            summary: summary.to_string(),
            url: "https://example.com/filing.htm".to_string(),
        }
    }

    #[test]
    fn detects_officer_changes_in_8k() {
        let points = extract_key_points(&filing(
            "8-K",
            "Announcement of the resignation of the chief financial officer",
        ));
        assert!(points.contains(&"8-K: Officer changes".to_string()));
    }

    #[test]
    fn detects_financial_performance_in_periodic_reports() {
        let points = extract_key_points(&filing(
            "10-Q",
            "Quarterly revenue fell short of prior guidance",
        ));
        assert!(points.contains(&"10-Q: Financial performance".to_string()));
    }

    #[test]
    fn caps_key_points_at_three() {
        let points = extract_key_points(&filing(
            "8-K",
            "officer resignation, earnings warning, merger agreement, \
             dividend cut, regulatory investigation and a securities offering",
        ));
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn empty_summary_yields_no_key_points() {
        assert!(extract_key_points(&filing("8-K", "  ")).is_empty());
    }

    #[test]
    fn clean_summary_collapses_whitespace() {
        assert_eq!(
            clean_summary("quarterly   results \n\n were   strong"),
            "quarterly results were strong"
        );
    }

    #[test]
    fn clean_summary_truncates_long_text() {
        let long = "word ".repeat(100);
        let cleaned = clean_summary(&long);
        assert_eq!(cleaned.chars().count(), 200);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn blank_summary_gets_placeholder() {
        assert_eq!(clean_summary(""), "No summary available");
        assert_eq!(clean_summary("   "), "No summary available");
    }

    #[test]
    fn filing_summary_carries_all_fields() {
        let scored = ScoredFiling {
            filing: filing("8-K", "Merger announcement"),
            relevance_score: 0.95,
        };
        let context = create_filing_summary(&scored);

        assert_eq!(context.form_type, "8-K");
        assert_eq!(context.url, "https://example.com/filing.htm");
        assert!((context.relevance_score - 0.95).abs() < 1e-9);
        assert!(!context.key_points.is_empty());
        assert_eq!(context.summary, "Merger announcement");
    }
}
