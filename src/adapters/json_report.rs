//! JSON report adapter implementing ReportPort.
//!
//! Writes the full [`BacktestResponse`]: weight series, run metadata and
//! warnings, pretty printed.

use std::fs;
use std::path::Path;

use crate::domain::backtest::{BacktestOutcome, BacktestResponse};
use crate::domain::error::RebalanceError;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(outcome: &BacktestOutcome) -> Result<String, RebalanceError> {
        let response = BacktestResponse::from(outcome.clone());
        Ok(serde_json::to_string_pretty(&response)?)
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, outcome: &BacktestOutcome, output_path: &Path) -> Result<(), RebalanceError> {
        let json = Self::render(outcome)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;
        Ok(())
    }

    fn default_extension(&self) -> &'static str {
        "json"
    }
}
