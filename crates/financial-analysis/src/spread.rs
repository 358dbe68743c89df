use crate::model::{Durability, RoicHistory, SpreadResult, SpreadTrend, WaccResult};

/// Slope past which a 3-year spread move counts as a real trend
const TREND_SLOPE_THRESHOLD: f64 = 0.02;

/// Classify the spread trend from the 3 most recent values. Fewer than 3
/// years defaults to stable.
pub(crate) fn classify_trend(spread_history: &[f64]) -> SpreadTrend {
    if spread_history.len() < 3 {
        return SpreadTrend::Stable;
    }
    let recent = &spread_history[spread_history.len() - 3..];
    // Change over the 2 year-steps spanned by the window.
    let slope = (recent[2] - recent[0]) / 2.0;

    if slope > TREND_SLOPE_THRESHOLD {
        SpreadTrend::Improving
    } else if slope < -TREND_SLOPE_THRESHOLD {
        SpreadTrend::Deteriorating
    } else {
        SpreadTrend::Stable
    }
}

/// Durability of the spread from its level and trend. The conditions
/// overlap, so evaluation order is part of the contract: strong first,
/// then weak, else uncertain.
pub(crate) fn assess_durability(current_spread: f64, trend: SpreadTrend) -> Durability {
    if current_spread > 0.05 && trend == SpreadTrend::Improving {
        Durability::Strong
    } else if current_spread < 0.0
        || (trend == SpreadTrend::Deteriorating && current_spread < 0.03)
    {
        Durability::Weak
    } else {
        Durability::Uncertain
    }
}

/// Combine a ROIC history and a WACC into the spread analysis.
///
/// The latest baseline WACC is subtracted from every historical ROIC year;
/// no per-year WACC series is reconstructed. This is a known approximation
/// kept deliberately; downstream consumers depend on it.
pub fn build_spread_result(roic: RoicHistory, wacc: WaccResult) -> SpreadResult {
    let spread_history: Vec<f64> = roic
        .records
        .iter()
        .map(|r| r.roic - wacc.baseline)
        .collect();
    let years = roic.years();
    let current_spread = spread_history.last().copied().unwrap_or(0.0);
    let trend = classify_trend(&spread_history);
    let durability = assess_durability(current_spread, trend);

    SpreadResult {
        current_spread,
        spread_history,
        years,
        trend,
        durability,
        roic_data: roic,
        wacc,
    }
}
