//! Concrete adapter implementations for ports.

pub mod analytical_store;
pub mod csv_report;
pub mod field_data;
pub mod file_config_adapter;
pub mod json_report;
pub mod local_files;
#[cfg(feature = "sample-data")]
pub mod sample_data;
