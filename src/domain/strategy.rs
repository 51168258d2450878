//! Strategy tag resolution shared by the calendar, filter and weighting
//! families.
//!
//! Each family declares a closed enum of kinds. Resolving a tag goes through
//! the kind table; building the implementation is an exhaustive match in the
//! family module, so adding a strategy means adding a variant and its tag.

use crate::domain::error::RebalanceError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub trait StrategyKind: Sized + Copy + 'static {
    /// Component name used in error messages ("calendar", "filter", ...).
    const COMPONENT: &'static str;
    /// Key holding the tag in a rule mapping.
    const TAG_FIELD: &'static str;
    const ALL: &'static [Self];

    fn tag(self) -> &'static str;

    fn supported_tags() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.tag()).collect()
    }

    fn from_tag(tag: &str) -> Result<Self, RebalanceError> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| RebalanceError::UnknownStrategy {
                component: Self::COMPONENT,
                tag: tag.to_string(),
                supported: Self::supported_tags(),
            })
    }
}

/// Decode a key-value rule mapping into its typed rule.
///
/// The tag is checked before the rest of the shape so that an unknown tag is
/// reported as such even when the remaining keys are incomplete.
pub fn rule_from_map<K, R>(map: &Map<String, Value>) -> Result<R, RebalanceError>
where
    K: StrategyKind,
    R: DeserializeOwned,
{
    let tag = map
        .get(K::TAG_FIELD)
        .or_else(|| map.get("tag"))
        .and_then(Value::as_str)
        .ok_or_else(|| RebalanceError::InvalidRule {
            component: K::COMPONENT,
            reason: format!("missing '{}' field", K::TAG_FIELD),
        })?;
    K::from_tag(tag)?;

    serde_json::from_value(Value::Object(map.clone())).map_err(|e| RebalanceError::InvalidRule {
        component: K::COMPONENT,
        reason: e.to_string(),
    })
}
