//! Domain error types.
//!
//! Three fatal categories surface to callers: configuration errors (unknown
//! strategy tags, malformed rules or settings), calendar range errors, and
//! data access errors. Per-date failures inside a run never reach this type;
//! the engine turns them into warnings.

use chrono::NaiveDate;

/// Top-level error type for rebalancer.
#[derive(Debug, thiserror::Error)]
pub enum RebalanceError {
    #[error("unknown {component} type '{tag}', available options: {supported:?}")]
    UnknownStrategy {
        component: &'static str,
        tag: String,
        supported: Vec<&'static str>,
    },

    #[error("invalid {component} rules: {reason}")]
    InvalidRule {
        component: &'static str,
        reason: String,
    },

    #[error("invalid backtest request: {reason}")]
    InvalidRequest { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("start date {start} outside available range {min} to {max}")]
    CalendarRange {
        start: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid file location: {0:?}")]
    InvalidLocation(String),

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("data not found: {reason}")]
    DataNotFound { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RebalanceError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RebalanceError::UnknownStrategy { .. }
                | RebalanceError::InvalidRule { .. }
                | RebalanceError::InvalidRequest { .. }
                | RebalanceError::ConfigParse { .. }
                | RebalanceError::ConfigMissing { .. }
                | RebalanceError::ConfigInvalid { .. }
        )
    }

    pub fn is_calendar_range(&self) -> bool {
        matches!(self, RebalanceError::CalendarRange { .. })
    }

    pub fn is_data_access(&self) -> bool {
        matches!(
            self,
            RebalanceError::InvalidIdentifier(_)
                | RebalanceError::InvalidLocation(_)
                | RebalanceError::Database { .. }
                | RebalanceError::DatabaseQuery { .. }
                | RebalanceError::DataNotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for RebalanceError {
    fn from(e: rusqlite::Error) -> Self {
        RebalanceError::DatabaseQuery {
            reason: e.to_string(),
        }
    }
}

impl From<&RebalanceError> for std::process::ExitCode {
    fn from(err: &RebalanceError) -> Self {
        let code: u8 = match err {
            RebalanceError::Io(_) | RebalanceError::Json(_) | RebalanceError::Csv(_) => 1,
            RebalanceError::ConfigParse { .. }
            | RebalanceError::ConfigMissing { .. }
            | RebalanceError::ConfigInvalid { .. } => 2,
            RebalanceError::InvalidIdentifier(_)
            | RebalanceError::InvalidLocation(_)
            | RebalanceError::Database { .. }
            | RebalanceError::DatabaseQuery { .. }
            | RebalanceError::DataNotFound { .. } => 3,
            RebalanceError::UnknownStrategy { .. }
            | RebalanceError::InvalidRule { .. }
            | RebalanceError::InvalidRequest { .. } => 4,
            RebalanceError::CalendarRange { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
