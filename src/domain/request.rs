//! Backtest request: calendar, portfolio creation and weighting rules.
//!
//! Strategy tags stay plain strings here so that an unknown tag reaches the
//! strategy factories and is reported with the list of supported tags.

use crate::domain::error::RebalanceError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical data series a portfolio can be ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataField {
    MarketCapitalization,
    Prices,
    Volume,
    Adtv3Month,
}

impl DataField {
    pub const ALL: [DataField; 4] = [
        DataField::MarketCapitalization,
        DataField::Prices,
        DataField::Volume,
        DataField::Adtv3Month,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataField::MarketCapitalization => "market_capitalization",
            DataField::Prices => "prices",
            DataField::Volume => "volume",
            DataField::Adtv3Month => "adtv_3_month",
        }
    }

    fn allowed_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.as_str()).collect()
    }
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "invalid data_field: {s:?}, must be one of {:?}",
                    Self::allowed_names()
                )
            })
    }
}

impl TryFrom<String> for DataField {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataField> for String {
    fn from(field: DataField) -> Self {
        field.as_str().to_string()
    }
}

fn default_calendar_tag() -> String {
    "Quarterly".to_string()
}

fn default_filter_tag() -> String {
    "TopN".to_string()
}

fn default_weighting_tag() -> String {
    "Equal".to_string()
}

fn default_n() -> usize {
    10
}

fn default_data_field() -> DataField {
    DataField::MarketCapitalization
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRule {
    #[serde(default = "default_calendar_tag", alias = "tag")]
    pub rule_type: String,
    pub initial_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationRule {
    #[serde(default = "default_filter_tag", alias = "tag")]
    pub filter_type: String,
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default = "default_data_field")]
    pub data_field: DataField,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingRule {
    #[serde(default = "default_weighting_tag", alias = "tag")]
    pub weighting_type: String,
}

impl Default for WeightingRule {
    fn default() -> Self {
        Self {
            weighting_type: default_weighting_tag(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    #[serde(alias = "calendar_rules")]
    pub calendar_rule: CalendarRule,
    #[serde(alias = "portfolio_creation")]
    pub creation_rule: CreationRule,
    #[serde(default, alias = "weighting_scheme")]
    pub weighting_rule: WeightingRule,
}

impl BacktestRequest {
    pub fn new(initial_date: NaiveDate, n: usize, data_field: DataField) -> Self {
        Self {
            calendar_rule: CalendarRule {
                rule_type: default_calendar_tag(),
                initial_date,
            },
            creation_rule: CreationRule {
                filter_type: default_filter_tag(),
                n,
                data_field,
            },
            weighting_rule: WeightingRule::default(),
        }
    }

    /// Parse and validate a JSON request body.
    pub fn from_json(body: &str) -> Result<Self, RebalanceError> {
        let request: BacktestRequest =
            serde_json::from_str(body).map_err(|e| RebalanceError::InvalidRequest {
                reason: e.to_string(),
            })?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), RebalanceError> {
        if self.creation_rule.n == 0 {
            return Err(RebalanceError::InvalidRequest {
                reason: "n must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn data_field(&self) -> DataField {
        self.creation_rule.data_field
    }

    pub fn initial_date(&self) -> NaiveDate {
        self.calendar_rule.initial_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_field_accepts_allowed_names() {
        assert_eq!(
            "market_capitalization".parse::<DataField>(),
            Ok(DataField::MarketCapitalization)
        );
        assert_eq!("prices".parse::<DataField>(), Ok(DataField::Prices));
        assert_eq!("volume".parse::<DataField>(), Ok(DataField::Volume));
        assert_eq!("adtv_3_month".parse::<DataField>(), Ok(DataField::Adtv3Month));
    }

    #[test]
    fn data_field_rejects_everything_else() {
        for bad in [
            "",
            "Prices",
            " prices",
            "price",
            "prices; DROP TABLE x",
            "../prices",
            "prices!",
        ] {
            let err = bad.parse::<DataField>().unwrap_err();
            assert!(err.contains("market_capitalization"), "{err}");
        }
    }

    #[test]
    fn parses_full_request() {
        let request = BacktestRequest::from_json(
            r#"{
                "calendar_rule": {"rule_type": "Quarterly", "initial_date": "2024-01-01"},
                "creation_rule": {"filter_type": "TopN", "n": 5, "data_field": "volume"},
                "weighting_rule": {"weighting_type": "Equal"}
            }"#,
        )
        .unwrap();
        assert_eq!(request.initial_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(request.creation_rule.n, 5);
        assert_eq!(request.data_field(), DataField::Volume);
    }

    #[test]
    fn accepts_legacy_keys_and_tag_aliases() {
        let request = BacktestRequest::from_json(
            r#"{
                "calendar_rules": {"tag": "Quarterly", "initial_date": "2023-06-15"},
                "portfolio_creation": {"tag": "TopN", "n": 3},
                "weighting_scheme": {"tag": "Equal"}
            }"#,
        )
        .unwrap();
        assert_eq!(request.calendar_rule.rule_type, "Quarterly");
        assert_eq!(request.creation_rule.data_field, DataField::MarketCapitalization);
        assert_eq!(request.weighting_rule.weighting_type, "Equal");
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let request = BacktestRequest::from_json(
            r#"{"calendar_rule": {"initial_date": "2024-01-01"}, "creation_rule": {}}"#,
        )
        .unwrap();
        assert_eq!(request.calendar_rule.rule_type, "Quarterly");
        assert_eq!(request.creation_rule.filter_type, "TopN");
        assert_eq!(request.creation_rule.n, 10);
        assert_eq!(request.weighting_rule.weighting_type, "Equal");
    }

    #[test]
    fn rejects_zero_n() {
        let err = BacktestRequest::from_json(
            r#"{"calendar_rule": {"initial_date": "2024-01-01"}, "creation_rule": {"n": 0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RebalanceError::InvalidRequest { .. }));
    }

    #[test]
    fn rejects_negative_n() {
        let err = BacktestRequest::from_json(
            r#"{"calendar_rule": {"initial_date": "2024-01-01"}, "creation_rule": {"n": -3}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RebalanceError::InvalidRequest { .. }));
    }

    #[test]
    fn rejects_unknown_data_field() {
        let err = BacktestRequest::from_json(
            r#"{"calendar_rule": {"initial_date": "2024-01-01"},
                "creation_rule": {"data_field": "dividends"}}"#,
        )
        .unwrap_err();
        match err {
            RebalanceError::InvalidRequest { reason } => assert!(reason.contains("dividends")),
            other => panic!("expected InvalidRequest, got: {other}"),
        }
    }

    #[test]
    fn unknown_tags_survive_parsing() {
        let request = BacktestRequest::from_json(
            r#"{"calendar_rule": {"initial_date": "2024-01-01"},
                "creation_rule": {"filter_type": "LowN", "n": 2}}"#,
        )
        .unwrap();
        assert_eq!(request.creation_rule.filter_type, "LowN");
    }

    #[test]
    fn data_field_serializes_as_name() {
        let json = serde_json::to_string(&DataField::Adtv3Month).unwrap();
        assert_eq!(json, "\"adtv_3_month\"");
    }
}
