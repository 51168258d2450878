//! Weighting schemes: turn a selection into portfolio weights.

use crate::domain::error::RebalanceError;
use crate::domain::request::WeightingRule;
use crate::domain::strategy::{StrategyKind, rule_from_map};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Asset id -> weight for one rebalance date.
pub type PortfolioWeights = BTreeMap<String, f64>;

/// Allowed drift of the weight sum from 1.0 caused by rounding.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-5;

/// Rounding to six decimals moves each weight by at most half of this.
const PER_WEIGHT_ROUNDING: f64 = 1e-6;

pub trait Weighting {
    fn calculate(&self, assets: &[String]) -> PortfolioWeights;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingKind {
    Equal,
}

impl StrategyKind for WeightingKind {
    const COMPONENT: &'static str = "weighting";
    const TAG_FIELD: &'static str = "weighting_type";
    const ALL: &'static [Self] = &[WeightingKind::Equal];

    fn tag(self) -> &'static str {
        match self {
            WeightingKind::Equal => "Equal",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeighting;

impl Weighting for EqualWeighting {
    fn calculate(&self, assets: &[String]) -> PortfolioWeights {
        if assets.is_empty() {
            return PortfolioWeights::new();
        }
        let weight = round6(1.0 / assets.len() as f64);
        assets.iter().map(|a| (a.clone(), weight)).collect()
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Either empty, or non-negative entries summing to 1.0 within
/// [`WEIGHT_SUM_TOLERANCE`], widened for large portfolios where per-weight
/// rounding accumulates.
pub fn weights_are_valid(weights: &PortfolioWeights) -> bool {
    if weights.is_empty() {
        return true;
    }
    let all_non_negative = weights.values().all(|w| w.is_finite() && *w >= 0.0);
    let sum: f64 = weights.values().sum();
    let tolerance = WEIGHT_SUM_TOLERANCE.max(weights.len() as f64 * PER_WEIGHT_ROUNDING);
    all_non_negative && (sum - 1.0).abs() <= tolerance
}

pub fn build_weighting(rule: &WeightingRule) -> Result<Box<dyn Weighting>, RebalanceError> {
    match WeightingKind::from_tag(&rule.weighting_type)? {
        WeightingKind::Equal => Ok(Box::new(EqualWeighting)),
    }
}

pub fn weighting_from_map(map: &Map<String, Value>) -> Result<Box<dyn Weighting>, RebalanceError> {
    let rule: WeightingRule = rule_from_map::<WeightingKind, _>(map)?;
    build_weighting(&rule)
}
