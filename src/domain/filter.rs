//! Asset filters: pick which assets enter the portfolio on a rebalance date.

use crate::domain::error::RebalanceError;
use crate::domain::observation::AssetObservation;
use crate::domain::request::CreationRule;
use crate::domain::strategy::{StrategyKind, rule_from_map};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub trait Filter {
    /// Asset ids selected from one date's observations, best first.
    fn select(&self, observations: &[AssetObservation], n: usize) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    TopN,
}

impl StrategyKind for FilterKind {
    const COMPONENT: &'static str = "filter";
    const TAG_FIELD: &'static str = "filter_type";
    const ALL: &'static [Self] = &[FilterKind::TopN];

    fn tag(self) -> &'static str {
        match self {
            FilterKind::TopN => "TopN",
        }
    }
}

/// Ranks assets by value, largest first, and keeps the top `n`.
///
/// Only the first record of the date is ranked: everything after the first
/// change of date label or source row is ignored, so duplicate rows for a
/// date never contribute the same asset twice. Equal values keep their
/// column order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopNFilter;

impl Filter for TopNFilter {
    fn select(&self, observations: &[AssetObservation], n: usize) -> Vec<String> {
        let Some(first) = observations.first() else {
            return Vec::new();
        };

        let mut ranked: Vec<(&str, f64)> = observations
            .iter()
            .take_while(|obs| obs.date == first.date && obs.row == first.row)
            .filter_map(|obs| obs.value.as_f64().map(|v| (obs.asset_id.as_str(), v)))
            .collect();

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
            .into_iter()
            .take(n)
            .map(|(asset, _)| asset.to_string())
            .collect()
    }
}

pub fn build_filter(rule: &CreationRule) -> Result<Box<dyn Filter>, RebalanceError> {
    match FilterKind::from_tag(&rule.filter_type)? {
        FilterKind::TopN => Ok(Box::new(TopNFilter)),
    }
}

pub fn filter_from_map(map: &Map<String, Value>) -> Result<Box<dyn Filter>, RebalanceError> {
    let rule: CreationRule = rule_from_map::<FilterKind, _>(map)?;
    build_filter(&rule)
}
