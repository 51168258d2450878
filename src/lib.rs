//! rebalancer: portfolio rebalancing backtester.
//!
//! A backtest walks a calendar of rebalance dates, ranks assets from a
//! per-field data file on each date and assigns weights to the top ranked.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
