#![allow(dead_code)]

use chrono::NaiveDate;
use rebalancer::domain::error::RebalanceError;
pub use rebalancer::domain::observation::{AssetObservation, CellValue};
pub use rebalancer::domain::request::{BacktestRequest, DataField};
use rebalancer::ports::data_port::DataPort;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory `DataPort`: a fixed range plus per-date rows, with optional
/// per-date failures. Records every date it is asked for.
pub struct MockDataPort {
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub rows: HashMap<NaiveDate, Vec<(String, CellValue)>>,
    pub errors: HashMap<NaiveDate, String>,
    pub range_calls: Cell<usize>,
    pub queried: RefCell<Vec<NaiveDate>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            range: None,
            rows: HashMap::new(),
            errors: HashMap::new(),
            range_calls: Cell::new(0),
            queried: RefCell::new(Vec::new()),
        }
    }

    pub fn with_range(mut self, min: NaiveDate, max: NaiveDate) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_values(mut self, day: NaiveDate, values: &[(&str, f64)]) -> Self {
        self.rows.insert(
            day,
            values
                .iter()
                .map(|(asset, v)| (asset.to_string(), CellValue::Real(*v)))
                .collect(),
        );
        self
    }

    pub fn with_cells(mut self, day: NaiveDate, cells: Vec<(&str, CellValue)>) -> Self {
        self.rows.insert(
            day,
            cells
                .into_iter()
                .map(|(asset, v)| (asset.to_string(), v))
                .collect(),
        );
        self
    }

    pub fn with_error(mut self, day: NaiveDate, reason: &str) -> Self {
        self.errors.insert(day, reason.to_string());
        self
    }

    pub fn date_queries(&self) -> usize {
        self.queried.borrow().len()
    }
}

impl DataPort for MockDataPort {
    fn get_data_range(&self, _field: DataField) -> Result<(NaiveDate, NaiveDate), RebalanceError> {
        self.range_calls.set(self.range_calls.get() + 1);
        self.range.ok_or_else(|| RebalanceError::DataNotFound {
            reason: "no data".to_string(),
        })
    }

    fn get_data_for_dates(
        &self,
        _field: DataField,
        dates: &[NaiveDate],
    ) -> Result<Vec<AssetObservation>, RebalanceError> {
        let mut out = Vec::new();
        for day in dates {
            self.queried.borrow_mut().push(*day);
            if let Some(reason) = self.errors.get(day) {
                return Err(RebalanceError::DatabaseQuery {
                    reason: reason.clone(),
                });
            }
            if let Some(cells) = self.rows.get(day) {
                let label = day.format("%Y-%m-%d").to_string();
                out.extend(
                    cells
                        .iter()
                        .map(|(asset, v)| AssetObservation::new(label.clone(), asset, v.clone())),
                );
            }
        }
        Ok(out)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub const QUARTER_ENDS_FROM_2024: [(i32, u32, u32); 4] =
    [(2024, 3, 31), (2024, 6, 30), (2024, 9, 30), (2024, 12, 31)];

/// Three assets with distinct values on every quarter end of 2024.
pub fn three_asset_port() -> MockDataPort {
    let mut port = MockDataPort::new().with_range(date(2020, 1, 1), date(2025, 1, 22));
    for (y, m, d) in QUARTER_ENDS_FROM_2024 {
        port = port.with_values(date(y, m, d), &[("A", 300.0), ("B", 200.0), ("C", 100.0)]);
    }
    port
}

pub fn request(initial: NaiveDate, n: usize) -> BacktestRequest {
    BacktestRequest::new(initial, n, DataField::MarketCapitalization)
}

/// Wide CSV with one row per given date and the given asset values.
pub fn wide_csv(assets: &[&str], rows: &[(&str, &[f64])]) -> String {
    let mut out = String::from("date");
    for a in assets {
        out.push(',');
        out.push_str(a);
    }
    out.push('\n');
    for (day, values) in rows {
        out.push_str(day);
        for v in values.iter() {
            out.push(',');
            out.push_str(&v.to_string());
        }
        out.push('\n');
    }
    out
}
