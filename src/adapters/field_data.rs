//! `DataPort` backed by the analytical store.
//!
//! Each logical field is registered at most once per service, as table
//! `data_<field>`, the first time the engine asks for it.

use crate::adapters::analytical_store::AnalyticalStore;
use crate::domain::error::RebalanceError;
use crate::domain::observation::AssetObservation;
use crate::domain::request::DataField;
use crate::ports::data_port::DataPort;
use crate::ports::location_port::LocationPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct FieldDataService<L: LocationPort> {
    locator: L,
    store: AnalyticalStore,
    registered: Mutex<BTreeMap<DataField, String>>,
}

impl<L: LocationPort> FieldDataService<L> {
    pub fn new(locator: L, store: AnalyticalStore) -> Self {
        Self {
            locator,
            store,
            registered: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn table_name(field: DataField) -> String {
        format!("data_{}", field.as_str())
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Register `field` if it has not been registered yet and return its
    /// table name.
    pub fn ensure_registered(&self, field: DataField) -> Result<String, RebalanceError> {
        let mut registered = self.registered.lock().map_err(|_| RebalanceError::Database {
            reason: "registration lock poisoned".to_string(),
        })?;

        if let Some(table) = registered.get(&field) {
            return Ok(table.clone());
        }

        let location = self.locator.locate(field)?;
        let table = Self::table_name(field);
        self.store.register(&table, &location)?;
        registered.insert(field, table.clone());
        debug!(%field, %table, "field registered");
        Ok(table)
    }

    pub fn row_count(&self, field: DataField) -> Result<i64, RebalanceError> {
        let table = self.ensure_registered(field)?;
        self.store.row_count(&table)
    }

    /// Close the store and forget every registration.
    pub fn close(&self) -> Result<(), RebalanceError> {
        if let Ok(mut registered) = self.registered.lock() {
            registered.clear();
        }
        self.store.close()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RebalanceError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| RebalanceError::DatabaseQuery {
        reason: format!("invalid date {value:?}: {e}"),
    })
}

impl<L: LocationPort> DataPort for FieldDataService<L> {
    fn get_data_range(&self, field: DataField) -> Result<(NaiveDate, NaiveDate), RebalanceError> {
        let table = self.ensure_registered(field)?;
        match self.store.get_range(&table, None)? {
            (Some(min), Some(max)) => Ok((parse_date(&min)?, parse_date(&max)?)),
            _ => Err(RebalanceError::DataNotFound {
                reason: format!("no dated rows for {field}"),
            }),
        }
    }

    fn get_data_for_dates(
        &self,
        field: DataField,
        dates: &[NaiveDate],
    ) -> Result<Vec<AssetObservation>, RebalanceError> {
        let table = self.ensure_registered(field)?;
        let labels: Vec<String> = dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        self.store.filter_by_dates(&table, &labels, None)
    }
}
