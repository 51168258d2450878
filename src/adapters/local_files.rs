//! Local directory of per-field CSV files.

use crate::domain::error::RebalanceError;
use crate::domain::request::DataField;
use crate::ports::location_port::LocationPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_FILE_EXTENSION: &str = "csv";

pub struct LocalFileAdapter {
    data_dir: PathBuf,
}

impl LocalFileAdapter {
    /// Creates `data_dir` if it does not exist yet.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, RebalanceError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn field_path(&self, field: DataField) -> PathBuf {
        self.data_dir
            .join(format!("{}.{DATA_FILE_EXTENSION}", field.as_str()))
    }

    /// Fields with a data file present, in declaration order.
    pub fn available_fields(&self) -> Vec<DataField> {
        DataField::ALL
            .into_iter()
            .filter(|field| self.field_path(*field).is_file())
            .collect()
    }
}

/// A usable data file exists, is a regular `.csv` file and can be opened
/// for reading.
fn check_data_file(path: &Path) -> Result<(), RebalanceError> {
    if !path.exists() {
        return Err(RebalanceError::DataNotFound {
            reason: format!("no data file at {}", path.display()),
        });
    }
    if !path.is_file() {
        return Err(RebalanceError::DataNotFound {
            reason: format!("{} is not a file", path.display()),
        });
    }
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DATA_FILE_EXTENSION));
    if !is_csv {
        return Err(RebalanceError::DataNotFound {
            reason: format!("{} is not a .{DATA_FILE_EXTENSION} file", path.display()),
        });
    }
    fs::File::open(path).map_err(|e| RebalanceError::DataNotFound {
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    Ok(())
}

impl LocationPort for LocalFileAdapter {
    fn locate(&self, field: DataField) -> Result<String, RebalanceError> {
        let path = self.field_path(field);
        check_data_file(&path)?;

        let location = path
            .to_str()
            .ok_or_else(|| RebalanceError::InvalidLocation(path.display().to_string()))?;
        debug!(%field, %location, "located data file");
        Ok(location.to_string())
    }
}
