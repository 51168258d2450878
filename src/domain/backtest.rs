//! Backtest engine: the rebalance loop.
//!
//! A run validates the request and resolves its strategies, checks the start
//! date against the data's available range, generates rebalance dates up to
//! [`BACKTEST_HORIZON`], then processes one date at a time. Only the
//! preliminary steps can fail the run; anything that goes wrong for a single
//! date becomes a warning and the loop moves on.

use crate::domain::calendar::build_calendar;
use crate::domain::error::RebalanceError;
use crate::domain::metrics::{PerformanceMetrics, StrategySummary};
use crate::domain::request::BacktestRequest;
use crate::domain::selector::PortfolioSelector;
use crate::domain::weighting::PortfolioWeights;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info};

/// Last date a rebalance can fall on. Fixed regardless of the request.
pub const BACKTEST_HORIZON: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 22) {
    Some(date) => date,
    None => panic!("invalid backtest horizon"),
};

/// Everything a completed run hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    /// ISO date -> weights, for dates that produced a portfolio.
    pub weights: BTreeMap<String, PortfolioWeights>,
    pub metrics: PerformanceMetrics,
    pub warnings: Vec<String>,
}

/// Serialized shape of a run result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResponse {
    pub execution_time: f64,
    pub weights: BTreeMap<String, PortfolioWeights>,
    pub metadata: PerformanceMetrics,
    pub warnings: Vec<String>,
}

impl From<BacktestOutcome> for BacktestResponse {
    fn from(outcome: BacktestOutcome) -> Self {
        Self {
            execution_time: outcome.metrics.execution_time,
            weights: outcome.weights,
            metadata: outcome.metrics,
            warnings: outcome.warnings,
        }
    }
}

pub struct BacktestEngine<'a> {
    data_port: &'a dyn DataPort,
}

impl<'a> BacktestEngine<'a> {
    pub fn new(data_port: &'a dyn DataPort) -> Self {
        Self { data_port }
    }

    pub fn run(&self, request: &BacktestRequest) -> Result<BacktestOutcome, RebalanceError> {
        self.run_inner(request).inspect_err(|e| error!(error = %e, "backtest failed"))
    }

    fn run_inner(&self, request: &BacktestRequest) -> Result<BacktestOutcome, RebalanceError> {
        let started = Instant::now();

        request.validate()?;
        let calendar = build_calendar(&request.calendar_rule)?;
        let selector =
            PortfolioSelector::from_rules(&request.creation_rule, &request.weighting_rule)?;

        let field = request.data_field();
        let start = request.initial_date();
        let (min, max) = self.data_port.get_data_range(field)?;
        validate_start_date(start, min, max)?;

        let rebalance_dates = calendar.generate_dates(start, BACKTEST_HORIZON);
        info!(
            %field,
            %start,
            dates = rebalance_dates.len(),
            "running backtest"
        );

        let mut weights = BTreeMap::new();
        let mut warnings = Vec::new();

        for date in &rebalance_dates {
            let label = date.format("%Y-%m-%d").to_string();

            let observations = match self.data_port.get_data_for_dates(field, &[*date]) {
                Ok(obs) => obs,
                Err(e) => {
                    warnings.push(format!("Error processing {label}: {e}"));
                    continue;
                }
            };

            if observations.is_empty() {
                warnings.push(format!("No data available for {label}"));
                continue;
            }

            match selector.select_and_weight(&observations, &label) {
                Ok(selection) => {
                    if selection.is_short() {
                        warnings.push(format!(
                            "Only {} of {} requested assets selected for {label}",
                            selection.selected, selection.requested
                        ));
                    }
                    weights.insert(label, selection.weights);
                }
                Err(reason) => {
                    warnings.push(format!("No weights calculated for {label}: {reason}"));
                }
            }
        }

        let metrics = PerformanceMetrics::compute(
            started.elapsed().as_secs_f64(),
            &weights,
            rebalance_dates.len(),
            StrategySummary::from_request(request),
        );
        info!(
            processed = metrics.rebalance_dates_processed,
            total = metrics.total_rebalance_dates,
            warnings = warnings.len(),
            "backtest completed"
        );

        Ok(BacktestOutcome {
            weights,
            metrics,
            warnings,
        })
    }
}

pub fn validate_start_date(
    start: NaiveDate,
    min: NaiveDate,
    max: NaiveDate,
) -> Result<(), RebalanceError> {
    if start < min || start > max {
        return Err(RebalanceError::CalendarRange { start, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn horizon_is_fixed() {
        assert_eq!(BACKTEST_HORIZON, d(2025, 1, 22));
    }

    #[test]
    fn start_inside_range_passes() {
        assert!(validate_start_date(d(2024, 1, 1), d(2020, 1, 1), d(2025, 1, 22)).is_ok());
        assert!(validate_start_date(d(2020, 1, 1), d(2020, 1, 1), d(2025, 1, 22)).is_ok());
        assert!(validate_start_date(d(2025, 1, 22), d(2020, 1, 1), d(2025, 1, 22)).is_ok());
    }

    #[test]
    fn start_too_early_fails() {
        let err = validate_start_date(d(2019, 12, 31), d(2020, 1, 1), d(2025, 1, 22)).unwrap_err();
        assert!(matches!(err, RebalanceError::CalendarRange { .. }));
    }

    #[test]
    fn start_too_late_fails() {
        let err = validate_start_date(d(2025, 1, 23), d(2020, 1, 1), d(2025, 1, 22)).unwrap_err();
        assert!(err.is_calendar_range());
    }

    #[test]
    fn response_copies_execution_time() {
        let outcome = BacktestOutcome {
            weights: BTreeMap::new(),
            metrics: PerformanceMetrics::compute(
                0.5,
                &BTreeMap::new(),
                0,
                StrategySummary {
                    calendar: "Quarterly".into(),
                    filter: "TopN".into(),
                    weighting: "Equal".into(),
                },
            ),
            warnings: vec!["No data available for 2024-03-31".into()],
        };
        let response = BacktestResponse::from(outcome);
        assert_eq!(response.execution_time, 0.5);
        assert_eq!(response.metadata.execution_time, 0.5);
        assert_eq!(response.warnings.len(), 1);
    }
}
