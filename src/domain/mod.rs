//! Core domain types and logic.

pub mod backtest;
pub mod calendar;
pub mod config_validation;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod metrics;
pub mod observation;
pub mod request;
pub mod selector;
pub mod strategy;
pub mod weighting;
