use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 10-year Treasury proxy used when no risk-free override is given
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.040;
/// Equity market risk premium default
pub const DEFAULT_MARKET_RISK_PREMIUM: f64 = 0.055;
/// Market beta default
pub const DEFAULT_BETA: f64 = 1.0;

/// One fiscal year of ROIC data. `roic = nopat / invested_capital`,
/// and `invested_capital > 0` always holds for a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoicRecord {
    pub year: i32,
    pub roic: f64,
    pub nopat: f64,
    pub invested_capital: f64,
}

/// ROIC history ordered by year ascending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoicHistory {
    pub records: Vec<RoicRecord>,
}

impl RoicHistory {
    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn roic_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.roic).collect()
    }

    pub fn latest(&self) -> Option<&RoicRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Optional overrides for the CAPM cost-of-equity inputs. Any unset field
/// falls back to the corresponding default constant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaccAssumptions {
    pub risk_free_rate: Option<f64>,
    pub market_risk_premium: Option<f64>,
    pub beta: Option<f64>,
}

impl WaccAssumptions {
    pub fn is_default(&self) -> bool {
        self.risk_free_rate.is_none() && self.market_risk_premium.is_none() && self.beta.is_none()
    }
}

/// Everything needed to compute a WACC. `equity_ratio + debt_ratio == 1`
/// within floating tolerance; both are derived from `total_equity` and
/// `total_debt`, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccComponents {
    pub cost_of_equity: f64,
    pub cost_of_debt: f64,
    pub tax_rate: f64,
    pub equity_ratio: f64,
    pub debt_ratio: f64,
    pub total_equity: f64,
    pub total_debt: f64,
    pub risk_free_rate: f64,
    pub beta: f64,
    pub market_risk_premium: f64,
}

/// WACC calculation result. `scenarios` always holds "base"; "pessimistic"
/// and "optimistic" appear only when sensitivity was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccResult {
    pub baseline: f64,
    pub scenarios: HashMap<String, f64>,
    pub components: WaccComponents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadTrend {
    Improving,
    Deteriorating,
    Stable,
}

impl SpreadTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadTrend::Improving => "improving",
            SpreadTrend::Deteriorating => "deteriorating",
            SpreadTrend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    Strong,
    Uncertain,
    Weak,
}

impl Durability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Durability::Strong => "strong",
            Durability::Uncertain => "uncertain",
            Durability::Weak => "weak",
        }
    }
}

/// ROIC-WACC spread analysis for a ticker. `spread_history` lines up with
/// `years`, which line up with `roic_data.records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadResult {
    pub current_spread: f64,
    pub spread_history: Vec<f64>,
    pub years: Vec<i32>,
    pub trend: SpreadTrend,
    pub durability: Durability,
    pub roic_data: RoicHistory,
    pub wacc: WaccResult,
}
