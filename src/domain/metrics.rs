//! Run statistics reported alongside the weight series.

use crate::domain::request::BacktestRequest;
use crate::domain::weighting::PortfolioWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy tags echoed back from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub calendar: String,
    pub filter: String,
    pub weighting: String,
}

impl StrategySummary {
    pub fn from_request(request: &BacktestRequest) -> Self {
        Self {
            calendar: request.calendar_rule.rule_type.clone(),
            filter: request.creation_rule.filter_type.clone(),
            weighting: request.weighting_rule.weighting_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Wall-clock seconds for the whole run.
    pub execution_time: f64,
    /// Dates that produced weights.
    pub rebalance_dates_processed: usize,
    /// Dates the calendar generated.
    pub total_rebalance_dates: usize,
    pub average_assets_per_rebalance: f64,
    pub strategy: StrategySummary,
}

impl PerformanceMetrics {
    pub fn compute(
        execution_time: f64,
        weights: &BTreeMap<String, PortfolioWeights>,
        total_dates: usize,
        strategy: StrategySummary,
    ) -> Self {
        let average_assets_per_rebalance = if weights.is_empty() {
            0.0
        } else {
            let total_assets: usize = weights.values().map(|w| w.len()).sum();
            total_assets as f64 / weights.len() as f64
        };

        Self {
            execution_time,
            rebalance_dates_processed: weights.len(),
            total_rebalance_dates: total_dates,
            average_assets_per_rebalance,
            strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn summary() -> StrategySummary {
        StrategySummary {
            calendar: "Quarterly".into(),
            filter: "TopN".into(),
            weighting: "Equal".into(),
        }
    }

    fn weights(assets: &[&str]) -> PortfolioWeights {
        let w = 1.0 / assets.len() as f64;
        assets.iter().map(|a| (a.to_string(), w)).collect()
    }

    #[test]
    fn averages_asset_counts() {
        let mut series = BTreeMap::new();
        series.insert("2024-03-31".to_string(), weights(&["A", "B"]));
        series.insert("2024-06-30".to_string(), weights(&["A", "B", "C"]));

        let metrics = PerformanceMetrics::compute(0.25, &series, 4, summary());
        assert_eq!(metrics.rebalance_dates_processed, 2);
        assert_eq!(metrics.total_rebalance_dates, 4);
        assert_abs_diff_eq!(metrics.average_assets_per_rebalance, 2.5);
        assert_abs_diff_eq!(metrics.execution_time, 0.25);
    }

    #[test]
    fn empty_series_averages_to_zero() {
        let metrics = PerformanceMetrics::compute(0.0, &BTreeMap::new(), 3, summary());
        assert_eq!(metrics.rebalance_dates_processed, 0);
        assert_eq!(metrics.total_rebalance_dates, 3);
        assert_eq!(metrics.average_assets_per_rebalance, 0.0);
    }

    #[test]
    fn serializes_with_strategy_block() {
        let metrics = PerformanceMetrics::compute(1.5, &BTreeMap::new(), 0, summary());
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["strategy"]["filter"], "TopN");
        assert_eq!(json["total_rebalance_dates"], 0);
    }
}
