//! Date-range presets used by the policy and transaction filters.
//!
//! All presets resolve against an injected `today` so callers and tests
//! control the clock.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive date range. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn from(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: NaiveDate) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    /// Number of days covered, when both bounds are set.
    pub fn days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some((e - s).num_days() + 1),
            _ => None,
        }
    }

    /// The range of the same length that ends the day before `start`.
    pub fn previous(&self) -> Option<Self> {
        let start = self.start?;
        let days = self.days()?;
        let prev_end = start - Duration::days(1);
        Some(Self::new(prev_end - Duration::days(days - 1), prev_end))
    }
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

fn year_bounds(year: i32) -> Option<DateRange> {
    Some(DateRange::new(
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Expiration-date presets of the policy list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyPeriod {
    #[default]
    Todos,
    CurrentMonth,
    #[serde(rename = "next-30-days")]
    Next30Days,
    #[serde(rename = "next-90-days")]
    Next90Days,
    Expired,
    Custom,
}

impl PolicyPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::CurrentMonth => "current-month",
            Self::Next30Days => "next-30-days",
            Self::Next90Days => "next-90-days",
            Self::Expired => "expired",
            Self::Custom => "custom",
        }
    }

    /// Resolve the preset. `Todos` and an incomplete custom range return
    /// `None`, meaning no restriction.
    pub fn range(
        &self,
        today: NaiveDate,
        custom_start: Option<NaiveDate>,
        custom_end: Option<NaiveDate>,
    ) -> Option<DateRange> {
        match self {
            Self::Todos => None,
            Self::CurrentMonth => Some(DateRange::new(
                first_day_of_month(today),
                last_day_of_month(today),
            )),
            Self::Next30Days => Some(DateRange::new(today, today + Duration::days(30))),
            Self::Next90Days => Some(DateRange::new(today, today + Duration::days(90))),
            Self::Expired => today.pred_opt().map(DateRange::until),
            Self::Custom => match (custom_start, custom_end) {
                (Some(s), Some(e)) => Some(DateRange::new(s, e)),
                _ => None,
            },
        }
    }
}

impl FromStr for PolicyPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Todos,
            Self::CurrentMonth,
            Self::Next30Days,
            Self::Next90Days,
            Self::Expired,
            Self::Custom,
        ]
        .into_iter()
        .find(|p| p.as_str() == s.trim())
        .ok_or_else(|| format!("Unknown policy period: {}", s))
    }
}

impl fmt::Display for PolicyPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Competence-date presets of the financial module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionPeriod {
    #[default]
    All,
    CurrentMonth,
    LastMonth,
    CurrentYear,
    LastYear,
}

impl TransactionPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::CurrentMonth => "current-month",
            Self::LastMonth => "last-month",
            Self::CurrentYear => "current-year",
            Self::LastYear => "last-year",
        }
    }

    /// Resolve the preset. The "current" presets are open-ended so that
    /// forward-dated entries stay visible.
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            Self::All => None,
            Self::CurrentMonth => Some(DateRange::from(first_day_of_month(today))),
            Self::LastMonth => {
                let last_month_end = first_day_of_month(today).pred_opt()?;
                Some(DateRange::new(
                    first_day_of_month(last_month_end),
                    last_month_end,
                ))
            }
            Self::CurrentYear => {
                NaiveDate::from_ymd_opt(today.year(), 1, 1).map(DateRange::from)
            }
            Self::LastYear => year_bounds(today.year() - 1),
        }
    }
}

impl FromStr for TransactionPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::All,
            Self::CurrentMonth,
            Self::LastMonth,
            Self::CurrentYear,
            Self::LastYear,
        ]
        .into_iter()
        .find(|p| p.as_str() == s.trim())
        .ok_or_else(|| format!("Unknown transaction period: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_policy_presets() {
        let today = d(2024, 2, 10);
        assert_eq!(
            PolicyPeriod::CurrentMonth.range(today, None, None),
            Some(DateRange::new(d(2024, 2, 1), d(2024, 2, 29)))
        );
        assert_eq!(
            PolicyPeriod::Next30Days.range(today, None, None),
            Some(DateRange::new(today, d(2024, 3, 11)))
        );
        let expired = PolicyPeriod::Expired.range(today, None, None).unwrap();
        assert!(expired.contains(d(2024, 2, 9)));
        assert!(!expired.contains(today));
        assert_eq!(PolicyPeriod::Todos.range(today, None, None), None);
    }

    #[test]
    fn test_custom_needs_both_bounds() {
        let today = d(2024, 1, 1);
        assert_eq!(
            PolicyPeriod::Custom.range(today, Some(today), None),
            None
        );
        assert!(PolicyPeriod::Custom
            .range(today, Some(d(2024, 1, 5)), Some(d(2024, 1, 9)))
            .unwrap()
            .contains(d(2024, 1, 9)));
    }

    #[test]
    fn test_transaction_presets_cross_year() {
        let today = d(2024, 1, 15);
        assert_eq!(
            TransactionPeriod::LastMonth.range(today),
            Some(DateRange::new(d(2023, 12, 1), d(2023, 12, 31)))
        );
        assert_eq!(
            TransactionPeriod::LastYear.range(today),
            Some(DateRange::new(d(2023, 1, 1), d(2023, 12, 31)))
        );
        let current = TransactionPeriod::CurrentMonth.range(today).unwrap();
        assert!(current.contains(d(2024, 3, 1)));
        assert!(!current.contains(d(2023, 12, 31)));
    }

    #[test]
    fn test_previous_range_has_same_length() {
        let range = DateRange::new(d(2024, 3, 1), d(2024, 3, 31));
        let prev = range.previous().unwrap();
        assert_eq!(prev, DateRange::new(d(2024, 1, 30), d(2024, 2, 29)));
        assert_eq!(prev.days(), range.days());
    }

    #[test]
    fn test_parse_presets() {
        assert_eq!("next-90-days".parse::<PolicyPeriod>().unwrap(), PolicyPeriod::Next90Days);
        assert_eq!("last-year".parse::<TransactionPeriod>().unwrap(), TransactionPeriod::LastYear);
        assert!("yesterday".parse::<TransactionPeriod>().is_err());
        let json = serde_json::to_string(&PolicyPeriod::Next30Days).unwrap();
        assert_eq!(json, "\"next-30-days\"");
    }
}
