//! Rebalance calendars.

use crate::domain::error::RebalanceError;
use crate::domain::request::CalendarRule;
use crate::domain::strategy::{StrategyKind, rule_from_map};
use chrono::{Datelike, Months, NaiveDate};
use serde_json::{Map, Value};

pub trait Calendar {
    /// Rebalance dates within `[start, end]`, ascending.
    fn generate_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKind {
    Quarterly,
}

impl StrategyKind for CalendarKind {
    const COMPONENT: &'static str = "calendar";
    const TAG_FIELD: &'static str = "rule_type";
    const ALL: &'static [Self] = &[CalendarKind::Quarterly];

    fn tag(self) -> &'static str {
        match self {
            CalendarKind::Quarterly => "Quarterly",
        }
    }
}

/// Rebalances on the last calendar day of each quarter.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuarterlyCalendar;

impl QuarterlyCalendar {
    fn quarter_start(date: NaiveDate) -> Option<NaiveDate> {
        let month = (date.month0() / 3) * 3 + 1;
        NaiveDate::from_ymd_opt(date.year(), month, 1)
    }

    fn quarter_end(quarter_start: NaiveDate) -> Option<NaiveDate> {
        quarter_start
            .checked_add_months(Months::new(3))?
            .pred_opt()
    }
}

impl Calendar for QuarterlyCalendar {
    fn generate_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let Some(mut current) = Self::quarter_start(start) else {
            return dates;
        };

        while current <= end {
            let Some(quarter_end) = Self::quarter_end(current) else {
                break;
            };
            if start <= quarter_end && quarter_end <= end {
                dates.push(quarter_end);
            }
            match current.checked_add_months(Months::new(3)) {
                Some(next) => current = next,
                None => break,
            }
        }

        dates.sort();
        dates
    }
}

pub fn build_calendar(rule: &CalendarRule) -> Result<Box<dyn Calendar>, RebalanceError> {
    match CalendarKind::from_tag(&rule.rule_type)? {
        CalendarKind::Quarterly => Ok(Box::new(QuarterlyCalendar)),
    }
}

pub fn calendar_from_map(map: &Map<String, Value>) -> Result<Box<dyn Calendar>, RebalanceError> {
    let rule: CalendarRule = rule_from_map::<CalendarKind, _>(map)?;
    build_calendar(&rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn quarter_ends_for_one_year() {
        let dates = QuarterlyCalendar.generate_dates(d(2024, 1, 1), d(2024, 12, 31));
        assert_eq!(
            dates,
            vec![d(2024, 3, 31), d(2024, 6, 30), d(2024, 9, 30), d(2024, 12, 31)]
        );
    }

    #[test]
    fn mid_quarter_start_keeps_current_quarter_end() {
        let dates = QuarterlyCalendar.generate_dates(d(2024, 2, 15), d(2024, 7, 1));
        assert_eq!(dates, vec![d(2024, 3, 31), d(2024, 6, 30)]);
    }

    #[test]
    fn start_on_quarter_end_is_included() {
        let dates = QuarterlyCalendar.generate_dates(d(2024, 6, 30), d(2024, 9, 29));
        assert_eq!(dates, vec![d(2024, 6, 30)]);
    }

    #[test]
    fn leap_year_february_does_not_matter() {
        let dates = QuarterlyCalendar.generate_dates(d(2023, 12, 31), d(2024, 3, 31));
        assert_eq!(dates, vec![d(2023, 12, 31), d(2024, 3, 31)]);
    }

    #[test]
    fn horizon_cuts_partial_quarter() {
        let dates = QuarterlyCalendar.generate_dates(d(2024, 1, 1), d(2025, 1, 22));
        assert_eq!(dates.len(), 4);
        assert_eq!(*dates.last().unwrap(), d(2024, 12, 31));
    }

    #[test]
    fn start_after_end_yields_nothing() {
        assert!(
            QuarterlyCalendar
                .generate_dates(d(2025, 1, 1), d(2024, 1, 1))
                .is_empty()
        );
    }

    #[test]
    fn short_window_inside_quarter_yields_nothing() {
        assert!(
            QuarterlyCalendar
                .generate_dates(d(2024, 4, 2), d(2024, 6, 29))
                .is_empty()
        );
    }

    #[test]
    fn factory_builds_quarterly() {
        let rule = CalendarRule {
            rule_type: "Quarterly".into(),
            initial_date: d(2024, 1, 1),
        };
        let calendar = build_calendar(&rule).unwrap();
        assert_eq!(calendar.generate_dates(d(2024, 1, 1), d(2024, 3, 31)).len(), 1);
    }

    #[test]
    fn factory_rejects_unknown_tag() {
        let rule = CalendarRule {
            rule_type: "Monthly".into(),
            initial_date: d(2024, 1, 1),
        };
        match build_calendar(&rule) {
            Err(RebalanceError::UnknownStrategy { tag, supported, .. }) => {
                assert_eq!(tag, "Monthly");
                assert_eq!(supported, vec!["Quarterly"]);
            }
            Err(other) => panic!("expected UnknownStrategy, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn factory_accepts_mapping() {
        let map = serde_json::json!({"rule_type": "Quarterly", "initial_date": "2024-01-01"});
        let calendar = calendar_from_map(map.as_object().unwrap()).unwrap();
        assert_eq!(calendar.generate_dates(d(2024, 1, 1), d(2024, 6, 30)).len(), 2);
    }

    #[test]
    fn factory_mapping_without_tag_is_invalid() {
        let map = serde_json::json!({"initial_date": "2024-01-01"});
        assert!(matches!(
            calendar_from_map(map.as_object().unwrap()),
            Err(RebalanceError::InvalidRule { component: "calendar", .. })
        ));
    }
}
