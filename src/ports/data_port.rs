//! Data access port used by the backtest engine.

use crate::domain::error::RebalanceError;
use crate::domain::observation::AssetObservation;
use crate::domain::request::DataField;
use chrono::NaiveDate;

pub trait DataPort {
    /// Earliest and latest date available for `field`.
    fn get_data_range(&self, field: DataField) -> Result<(NaiveDate, NaiveDate), RebalanceError>;

    /// Observations recorded on any of `dates`, ascending by date.
    fn get_data_for_dates(
        &self,
        field: DataField,
        dates: &[NaiveDate],
    ) -> Result<Vec<AssetObservation>, RebalanceError>;
}
