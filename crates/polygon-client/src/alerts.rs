use tracing::{info, warn};
use watch_core::{AnalysisError, DailyClose, PriceAlert};

/// Drop percentage at which an alert triggers
pub const DEFAULT_DROP_THRESHOLD_PCT: f64 = 5.0;

/// Minimum closes required for a meaningful first-vs-last comparison
pub const MIN_PRICE_POINTS: usize = 5;

/// Check a window of daily closes for a price drop of at least
/// `threshold_pct` percent, first close versus last close.
///
/// A window shorter than [`MIN_PRICE_POINTS`] yields a non-triggered alert
/// with reason `insufficient_data` rather than an error; a non-positive
/// first close is invalid input. Closes are sorted by date before the
/// comparison, so callers may pass provider output as-is.
pub fn detect_price_drop(
    closes: &[DailyClose],
    threshold_pct: f64,
) -> Result<PriceAlert, AnalysisError> {
    if closes.len() < MIN_PRICE_POINTS {
        warn!(
            points = closes.len(),
            "insufficient price data for drop detection (minimum {MIN_PRICE_POINTS})"
        );
        return Ok(PriceAlert {
            alert_triggered: false,
            price_first_close: 0.0,
            price_last_close: 0.0,
            drop_percentage: 0.0,
            reason: "insufficient_data".to_string(),
            filing_context: Vec::new(),
        });
    }

    let mut sorted: Vec<&DailyClose> = closes.iter().collect();
    sorted.sort_by_key(|c| c.date);

    let price_first_close = sorted[0].close;
    let price_last_close = sorted[sorted.len() - 1].close;

    if price_first_close <= 0.0 {
        return Err(AnalysisError::InvalidData(format!(
            "Invalid first close price: {price_first_close} (must be > 0)"
        )));
    }

    let drop_percentage = (price_first_close - price_last_close) / price_first_close * 100.0;
    let alert_triggered = drop_percentage >= threshold_pct;

    let reason = if alert_triggered {
        format!("price_drop_{drop_percentage:.2}%")
    } else {
        format!("price_change_{drop_percentage:.2}%")
    };

    info!(
        drop_percentage = format!("{drop_percentage:.2}%"),
        alert_triggered, "price drop analysis complete"
    );

    Ok(PriceAlert {
        alert_triggered,
        price_first_close,
        price_last_close,
        drop_percentage,
        reason,
        filing_context: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn closes(prices: &[f64]) -> Vec<DailyClose> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyClose {
                date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                close,
                volume: Some(1_000_000.0),
            })
            .collect()
    }

    #[test]
    fn triggers_on_five_percent_drop() {
        let alert =
            detect_price_drop(&closes(&[200.0, 198.0, 195.0, 192.0, 188.0]), 5.0).unwrap();
        assert!(alert.alert_triggered);
        assert!((alert.drop_percentage - 6.0).abs() < 1e-9);
        assert_eq!(alert.reason, "price_drop_6.00%");
        assert!(alert.filing_context.is_empty());
    }

    #[test]
    fn does_not_trigger_below_threshold() {
        let alert =
            detect_price_drop(&closes(&[200.0, 199.0, 198.0, 197.0, 196.0]), 5.0).unwrap();
        assert!(!alert.alert_triggered);
        assert!(alert.reason.starts_with("price_change_"));
    }

    #[test]
    fn rising_prices_never_trigger() {
        let alert =
            detect_price_drop(&closes(&[100.0, 105.0, 110.0, 112.0, 115.0]), 5.0).unwrap();
        assert!(!alert.alert_triggered);
        assert!(alert.drop_percentage < 0.0);
    }

    #[test]
    fn short_window_reports_insufficient_data() {
        let alert = detect_price_drop(&closes(&[200.0, 180.0]), 5.0).unwrap();
        assert!(!alert.alert_triggered);
        assert_eq!(alert.reason, "insufficient_data");
        assert_eq!(alert.price_first_close, 0.0);
    }

    #[test]
    fn sorts_by_date_before_comparing() {
        let mut window = closes(&[200.0, 198.0, 195.0, 192.0, 188.0]);
        window.reverse();
        let alert = detect_price_drop(&window, 5.0).unwrap();
        assert!(alert.alert_triggered);
        assert!((alert.price_first_close - 200.0).abs() < 1e-9);
        assert!((alert.price_last_close - 188.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_first_close_is_invalid() {
        let err = detect_price_drop(&closes(&[0.0, 1.0, 2.0, 3.0, 4.0]), 5.0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }
}
