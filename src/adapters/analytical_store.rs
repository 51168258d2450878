//! Embedded analytical store over CSV files.
//!
//! Each data file is exposed as a SQLite virtual table through the `csv`
//! module, so queries read the file in place. The connection is opened on
//! first use and shared behind a mutex; registered tables live as long as
//! the connection does.
//!
//! Every table and column name is validated by
//! [`safe_identifier`](crate::domain::identifier::safe_identifier) and
//! double-quoted before it is placed in statement text. Dates are always
//! bound parameters.

use crate::domain::config_validation::StoreSettings;
use crate::domain::error::RebalanceError;
use crate::domain::identifier::{quoted, safe_identifier, validate_location};
use crate::domain::observation::{AssetObservation, CellValue};
use rusqlite::{Connection, params, params_from_iter};
use std::cmp::Ordering;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Column names recognised as the date column, in priority order.
pub const DATE_COLUMN_CANDIDATES: &[&str] = &["date", "__index_level_0__", "timestamp", "time"];

/// Column holding the asset identifier in long-format tables.
pub const ASSET_COLUMN: &str = "security";

pub struct AnalyticalStore {
    settings: StoreSettings,
    conn: Mutex<Option<Connection>>,
}

impl AnalyticalStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            conn: Mutex::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StoreSettings::default())
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn open(&self) -> Result<Connection, RebalanceError> {
        let conn = if self.settings.path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.settings.path)
        }
        .map_err(|e: rusqlite::Error| RebalanceError::Database {
            reason: format!("failed to open store at {}: {e}", self.settings.path),
        })?;

        rusqlite::vtab::csvtab::load_module(&conn).map_err(|e: rusqlite::Error| {
            RebalanceError::Database {
                reason: format!("failed to load csv module: {e}"),
            }
        })?;

        conn.pragma_update(None, "threads", self.settings.threads)
            .map_err(|e: rusqlite::Error| RebalanceError::Database {
                reason: format!("failed to set worker threads: {e}"),
            })?;

        info!(
            path = %self.settings.path,
            threads = self.settings.threads,
            "analytical store connected"
        );
        Ok(conn)
    }

    /// Run `f` against the shared connection, opening it if needed.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, RebalanceError>,
    ) -> Result<T, RebalanceError> {
        let mut guard = self.conn.lock().map_err(|_| RebalanceError::Database {
            reason: "store connection lock poisoned".to_string(),
        })?;
        let conn = match guard.take() {
            Some(conn) => conn,
            None => self.open()?,
        };
        f(guard.insert(conn))
    }

    /// Expose the CSV file at `location` as table `table`, replacing any
    /// table already registered under that name.
    pub fn register(&self, table: &str, location: &str) -> Result<(), RebalanceError> {
        let table_q = quoted(table)?;
        let location = validate_location(location)?;
        let sql = format!(
            "DROP TABLE IF EXISTS {table_q};
             CREATE VIRTUAL TABLE {table_q} USING csv(filename='{location}', header=yes);"
        );

        self.with_connection(|conn| {
            conn.execute_batch(&sql).map_err(|e: rusqlite::Error| {
                error!(%table, %location, error = %e, "table registration failed");
                RebalanceError::Database {
                    reason: format!("failed to register {location} as {table}: {e}"),
                }
            })
        })?;

        info!(%table, %location, "registered table");
        Ok(())
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>, RebalanceError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
            let names = stmt
                .query_map(params![table], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
    }

    /// Pick the date column of `table`: the first of
    /// [`DATE_COLUMN_CANDIDATES`] present (case-insensitive), otherwise the
    /// table's first column.
    pub fn detect_date_column(&self, table: &str) -> Result<String, RebalanceError> {
        let table = safe_identifier(table)?;
        let columns = self.column_names(table)?;
        if columns.is_empty() {
            return Err(RebalanceError::DataNotFound {
                reason: format!("table {table} does not exist"),
            });
        }

        for candidate in DATE_COLUMN_CANDIDATES {
            if let Some(column) = columns.iter().find(|c| c.eq_ignore_ascii_case(candidate)) {
                debug!(%table, %column, "detected date column");
                return Ok(column.clone());
            }
        }

        let fallback = columns[0].clone();
        warn!(%table, column = %fallback, "no recognised date column, using first column");
        Ok(fallback)
    }

    fn resolve_date_column(
        &self,
        table: &str,
        date_column: Option<&str>,
    ) -> Result<String, RebalanceError> {
        match date_column {
            Some(column) => safe_identifier(column).map(str::to_string),
            None => self.detect_date_column(table),
        }
    }

    /// Earliest and latest calendar date in the table. Both are `None` when
    /// the table has no rows with a parseable date.
    pub fn get_range(
        &self,
        table: &str,
        date_column: Option<&str>,
    ) -> Result<(Option<String>, Option<String>), RebalanceError> {
        let table_q = quoted(table)?;
        let column = self.resolve_date_column(table, date_column)?;
        let column_q = quoted(&column)?;
        let sql = format!("SELECT MIN(date({column_q})), MAX(date({column_q})) FROM {table_q}");

        let (min, max): (Option<String>, Option<String>) = self.with_connection(|conn| {
            conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(Into::into)
        })?;

        match (min, max) {
            (Some(min), Some(max)) => Ok((Some(min), Some(max))),
            _ => Ok((None, None)),
        }
    }

    /// All rows whose date falls on one of `dates`, ascending by date.
    ///
    /// Tables are wide: one row per date, one column per asset. Each
    /// non-date cell becomes one [`AssetObservation`] carrying the ordinal of
    /// its source row.
    pub fn filter_by_dates(
        &self,
        table: &str,
        dates: &[String],
        date_column: Option<&str>,
    ) -> Result<Vec<AssetObservation>, RebalanceError> {
        let table_q = quoted(table)?;
        if dates.is_empty() {
            debug!(%table, "no dates requested");
            return Ok(Vec::new());
        }

        let column = self.resolve_date_column(table, date_column)?;
        let column_q = quoted(&column)?;
        let placeholders = vec!["?"; dates.len()].join(", ");
        let sql = format!(
            "SELECT * FROM {table_q} WHERE date({column_q}) IN ({placeholders}) ORDER BY date({column_q})"
        );

        let observations = self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            let date_index = names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(&column))
                .ok_or_else(|| RebalanceError::DataNotFound {
                    reason: format!("column {column} not found in {table}"),
                })?;

            let mut rows = stmt.query(params_from_iter(dates.iter()))?;
            let mut observations = Vec::new();
            let mut ordinal = 0;
            while let Some(row) = rows.next()? {
                let label = CellValue::from(row.get_ref(date_index)?).as_label();
                for (index, asset) in names.iter().enumerate() {
                    if index == date_index {
                        continue;
                    }
                    observations.push(
                        AssetObservation::new(
                            label.clone(),
                            asset.clone(),
                            CellValue::from(row.get_ref(index)?),
                        )
                        .with_row(ordinal),
                    );
                }
                ordinal += 1;
            }
            Ok(observations)
        })?;

        debug!(%table, dates = dates.len(), rows = observations.len(), "filtered by dates");
        Ok(observations)
    }

    /// Up to `n` values of the `security` column on `date`, highest
    /// `value_column` first. Rows whose value is blank or not numeric are
    /// skipped before the limit applies; ties keep file order.
    pub fn top_n_by_value(
        &self,
        table: &str,
        date: &str,
        value_column: &str,
        n: i64,
        date_column: Option<&str>,
    ) -> Result<Vec<String>, RebalanceError> {
        let table_q = quoted(table)?;
        let value_q = quoted(value_column)?;
        let asset_q = quoted(ASSET_COLUMN)?;
        if n < 0 {
            return Err(RebalanceError::DatabaseQuery {
                reason: format!("parameter n must be non-negative, got {n}"),
            });
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let column = self.resolve_date_column(table, date_column)?;
        let column_q = quoted(&column)?;
        let sql = format!("SELECT {asset_q}, {value_q} FROM {table_q} WHERE date({column_q}) = ?1");

        let rows: Vec<(String, CellValue)> = self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![date], |row| {
                    Ok((
                        CellValue::from(row.get_ref(0)?).as_label(),
                        CellValue::from(row.get_ref(1)?),
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let mut ranked: Vec<(String, f64)> = rows
            .into_iter()
            .filter_map(|(asset, value)| value.as_f64().map(|v| (asset, v)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(ranked
            .into_iter()
            .take(n as usize)
            .map(|(asset, _)| asset)
            .collect())
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> Result<i64, RebalanceError> {
        let table_q = quoted(table)?;
        let sql = format!("SELECT COUNT(*) FROM {table_q}");
        self.with_connection(|conn| conn.query_row(&sql, [], |row| row.get(0)).map_err(Into::into))
    }

    /// Drop the connection and everything registered on it. The next call
    /// opens a fresh connection.
    pub fn close(&self) -> Result<(), RebalanceError> {
        let mut guard = self.conn.lock().map_err(|_| RebalanceError::Database {
            reason: "store connection lock poisoned".to_string(),
        })?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| RebalanceError::Database {
                reason: format!("failed to close store: {e}"),
            })?;
            info!("analytical store closed");
        }
        Ok(())
    }
}

impl Drop for AnalyticalStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "error closing analytical store");
        }
    }
}
