//! Application settings and their validation.
//!
//! Settings are read once from a [`ConfigPort`], validated, and then passed
//! by value into the constructors that need them.

use crate::domain::error::RebalanceError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = ":memory:";
pub const DEFAULT_STORE_THREADS: u32 = 4;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const MAX_STORE_THREADS: i64 = 64;
const SUPPORTED_BACKENDS: &[&str] = &["local"];
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// SQLite database path, `:memory:` for an in-process database.
    pub path: String,
    /// Auxiliary worker threads SQLite may use for a single statement.
    pub threads: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_PATH.to_string(),
            threads: DEFAULT_STORE_THREADS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub store: StoreSettings,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, RebalanceError> {
        validate_app_config(config)?;

        let data_dir = config
            .get_trimmed("data", "dir")
            .map(PathBuf::from)
            .ok_or_else(|| missing("data", "dir"))?;

        Ok(Self {
            data_dir,
            store: StoreSettings {
                path: config
                    .get_trimmed("store", "path")
                    .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
                threads: config.get_int("store", "threads", DEFAULT_STORE_THREADS as i64) as u32,
            },
            log_level: config
                .get_trimmed("log", "level")
                .map(|l| l.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

pub fn validate_app_config(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    validate_data_dir(config)?;
    validate_backend(config)?;
    validate_store_threads(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn missing(section: &str, key: &str) -> RebalanceError {
    RebalanceError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    match config.get_trimmed("data", "dir") {
        Some(_) => Ok(()),
        None => Err(missing("data", "dir")),
    }
}

fn validate_backend(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    match config.get_trimmed("data", "backend") {
        None => Ok(()),
        Some(backend) if SUPPORTED_BACKENDS.contains(&backend.as_str()) => Ok(()),
        Some(backend) => Err(RebalanceError::ConfigInvalid {
            section: "data".to_string(),
            key: "backend".to_string(),
            reason: format!("unsupported backend '{backend}', expected one of {SUPPORTED_BACKENDS:?}"),
        }),
    }
}

fn validate_store_threads(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    let value = config.get_int("store", "threads", DEFAULT_STORE_THREADS as i64);
    if !(1..=MAX_STORE_THREADS).contains(&value) {
        return Err(RebalanceError::ConfigInvalid {
            section: "store".to_string(),
            key: "threads".to_string(),
            reason: format!("threads must be between 1 and {MAX_STORE_THREADS}"),
        });
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    match config.get_trimmed("log", "level") {
        None => Ok(()),
        Some(level) if LOG_LEVELS.contains(&level.to_lowercase().as_str()) => Ok(()),
        Some(level) => Err(RebalanceError::ConfigInvalid {
            section: "log".to_string(),
            key: "level".to_string(),
            reason: format!("unknown level '{level}', expected one of {LOG_LEVELS:?}"),
        }),
    }
}
