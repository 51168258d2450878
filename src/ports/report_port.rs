//! Report generation port.

use crate::domain::backtest::BacktestOutcome;
use crate::domain::error::RebalanceError;
use std::path::Path;

/// Port for writing backtest results.
pub trait ReportPort {
    fn write(&self, outcome: &BacktestOutcome, output_path: &Path) -> Result<(), RebalanceError>;

    /// File extension used when no output path is given.
    fn default_extension(&self) -> &'static str;
}
