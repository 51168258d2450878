//! Maps a logical data field to the physical location of its file.

use crate::domain::error::RebalanceError;
use crate::domain::request::DataField;

pub trait LocationPort {
    /// Physical location of the file backing `field`, or `DataNotFound`.
    fn locate(&self, field: DataField) -> Result<String, RebalanceError>;
}
