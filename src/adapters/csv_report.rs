//! CSV report adapter: the weight series in long format.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestOutcome;
use crate::domain::error::RebalanceError;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_rows<W: std::io::Write>(
        outcome: &BacktestOutcome,
        writer: W,
    ) -> Result<(), RebalanceError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["date", "asset", "weight"])?;
        for (date, weights) in &outcome.weights {
            for (asset, weight) in weights {
                let weight = weight.to_string();
                wtr.write_record([date.as_str(), asset.as_str(), weight.as_str()])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, outcome: &BacktestOutcome, output_path: &Path) -> Result<(), RebalanceError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(output_path)?;
        Self::write_rows(outcome, file)
    }

    fn default_extension(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{PerformanceMetrics, StrategySummary};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn outcome(weights: BTreeMap<String, BTreeMap<String, f64>>) -> BacktestOutcome {
        let metrics = PerformanceMetrics::compute(
            0.0,
            &weights,
            weights.len(),
            StrategySummary {
                calendar: "Quarterly".into(),
                filter: "TopN".into(),
                weighting: "Equal".into(),
            },
        );
        BacktestOutcome {
            weights,
            metrics,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn csv_report_writes_long_rows() {
        let mut weights = BTreeMap::new();
        weights.insert(
            "2024-06-30".to_string(),
            BTreeMap::from([("B".to_string(), 1.0)]),
        );
        weights.insert(
            "2024-03-31".to_string(),
            BTreeMap::from([("A".to_string(), 0.5), ("C".to_string(), 0.5)]),
        );

        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        CsvReportAdapter::new().write(&outcome(weights), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "date,asset,weight",
                "2024-03-31,A,0.5",
                "2024-03-31,C,0.5",
                "2024-06-30,B,1",
            ]
        );
    }

    #[test]
    fn csv_report_empty_series_has_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        CsvReportAdapter::new()
            .write(&outcome(BTreeMap::new()), &path)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "date,asset,weight\n");
    }
}
