//! Asset observations read from a registered table.

/// A raw cell as stored in the table. CSV-backed tables yield text for every
/// cell; numeric coercion happens when a strategy ranks the values.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Numeric view of the cell. Blank, non-numeric and non-finite values
    /// are treated as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Null => return None,
            CellValue::Integer(i) => *i as f64,
            CellValue::Real(r) => *r,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Text form used for date labels and asset identifiers.
    pub fn as_label(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(r) => r.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for CellValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(r) => CellValue::Real(r),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(_) => CellValue::Null,
        }
    }
}

/// One (date, asset, value) observation.
///
/// `row` is the ordinal of the source record within the query result, so
/// cells flattened from the same wide row share it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetObservation {
    pub date: String,
    pub asset_id: String,
    pub value: CellValue,
    pub row: usize,
}

impl AssetObservation {
    pub fn new(date: impl Into<String>, asset_id: impl Into<String>, value: CellValue) -> Self {
        Self {
            date: date.into(),
            asset_id: asset_id.into(),
            value,
            row: 0,
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }
}

/// Reduce a timestamp-like label (`2024-03-31 00:00:00`, `2024-03-31T00:00:00`)
/// to its `YYYY-MM-DD` date part. Labels that are not timestamp-like are
/// returned unchanged.
pub fn normalize_date_label(label: &str) -> String {
    let trimmed = label.trim();
    match trimmed.get(..10) {
        Some(day)
            if trimmed.len() > 10
                && matches!(trimmed.as_bytes()[10], b' ' | b'T')
                && chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").is_ok() =>
        {
            day.to_string()
        }
        _ => trimmed.to_string(),
    }
}
