//! Portfolio selection for a single rebalance date: filter, then weight.

use crate::domain::error::RebalanceError;
use crate::domain::filter::{Filter, build_filter};
use crate::domain::observation::{AssetObservation, normalize_date_label};
use crate::domain::request::{CreationRule, WeightingRule};
use crate::domain::weighting::{PortfolioWeights, Weighting, build_weighting, weights_are_valid};
use tracing::{debug, warn};

/// Why a date produced no weights.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("no observations")]
    NoObservations,

    #[error("no assets with numeric values")]
    NothingSelected,

    #[error("weights do not sum to 1 (sum {sum:.6})")]
    InvalidWeights { sum: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub weights: PortfolioWeights,
    pub requested: usize,
    pub selected: usize,
}

impl Selection {
    pub fn is_short(&self) -> bool {
        self.selected < self.requested
    }
}

pub struct PortfolioSelector {
    filter: Box<dyn Filter>,
    weighting: Box<dyn Weighting>,
    n: usize,
}

impl PortfolioSelector {
    pub fn new(filter: Box<dyn Filter>, weighting: Box<dyn Weighting>, n: usize) -> Self {
        Self {
            filter,
            weighting,
            n,
        }
    }

    /// Resolve both strategies from the request rules.
    pub fn from_rules(
        creation: &CreationRule,
        weighting: &WeightingRule,
    ) -> Result<Self, RebalanceError> {
        Ok(Self::new(
            build_filter(creation)?,
            build_weighting(weighting)?,
            creation.n,
        ))
    }

    pub fn select_and_weight(
        &self,
        observations: &[AssetObservation],
        date_label: &str,
    ) -> Result<Selection, SelectionError> {
        if observations.is_empty() {
            warn!(date = date_label, "no data available for selection");
            return Err(SelectionError::NoObservations);
        }

        let normalized: Vec<AssetObservation> = observations
            .iter()
            .map(|obs| AssetObservation {
                date: normalize_date_label(&obs.date),
                ..obs.clone()
            })
            .collect();

        let selected = self.filter.select(&normalized, self.n);
        if selected.is_empty() {
            return Err(SelectionError::NothingSelected);
        }
        if selected.len() < self.n {
            warn!(
                date = date_label,
                selected = selected.len(),
                requested = self.n,
                "fewer assets selected than requested"
            );
        }

        let weights = self.weighting.calculate(&selected);
        if weights.is_empty() || !weights_are_valid(&weights) {
            return Err(SelectionError::InvalidWeights {
                sum: weights.values().sum(),
            });
        }

        debug!(date = date_label, assets = weights.len(), "portfolio selection completed");
        Ok(Selection {
            selected: weights.len(),
            requested: self.n,
            weights,
        })
    }
}
