//! Calendar helpers for NARR time domains.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::NarrError;

/// First day of the NARR record; index 0 of the monthly aggregation.
pub const NARR_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1979, 1, 1) {
    Some(date) => date,
    None => panic!("invalid NARR epoch"),
};

/// Temporal granularity of a request.
///
/// Hourly and daily requests read the three-hourly monthly files; monthly
/// requests read the single pre-aggregated monthly dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeResolution {
    Hourly,
    Daily,
    #[default]
    Monthly,
}

impl TimeResolution {
    /// Tag used in domain names and canonical plan names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeResolution::Hourly => "hourly",
            TimeResolution::Daily => "daily",
            TimeResolution::Monthly => "monthly",
        }
    }

    /// Whether requests at this resolution are split into one domain per month.
    pub fn is_partitioned_by_month(&self) -> bool {
        matches!(self, TimeResolution::Hourly | TimeResolution::Daily)
    }
}

impl fmt::Display for TimeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeResolution {
    type Err = NarrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(TimeResolution::Hourly),
            "daily" => Ok(TimeResolution::Daily),
            "monthly" => Ok(TimeResolution::Monthly),
            other => Err(NarrError::invalid_parameter(
                "time_resolution",
                format!("unknown resolution '{}'", other),
            )),
        }
    }
}

/// Number of calendar month boundaries between two dates.
///
/// Days are ignored: 1980-01-31 to 1980-02-01 spans one month. Negative
/// when `end` falls in an earlier month than `start`.
pub fn month_span(start: NaiveDate, end: NaiveDate) -> i64 {
    (end.year() as i64 - start.year() as i64) * 12 + (end.month() as i64 - start.month() as i64)
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month.
    date.with_day(1).unwrap_or(date)
}

/// Step `date` forward by whole months, clamping the day to the target month.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_span() {
        assert_eq!(month_span(ymd(1980, 1, 15), ymd(1980, 3, 15)), 2);
        assert_eq!(month_span(ymd(1980, 1, 31), ymd(1980, 2, 1)), 1);
        assert_eq!(month_span(ymd(1979, 1, 1), ymd(1979, 1, 31)), 0);
        assert_eq!(month_span(ymd(1979, 11, 1), ymd(1981, 2, 1)), 15);
        assert_eq!(month_span(ymd(1980, 3, 1), ymd(1980, 1, 1)), -2);
    }

    #[test]
    fn test_resolution_round_trip_through_str() {
        for res in [TimeResolution::Hourly, TimeResolution::Daily, TimeResolution::Monthly] {
            assert_eq!(res.as_str().parse::<TimeResolution>().unwrap(), res);
        }
        assert!("weekly".parse::<TimeResolution>().is_err());
    }

    #[test]
    fn test_epoch() {
        assert_eq!(NARR_EPOCH, ymd(1979, 1, 1));
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(ymd(1980, 1, 31), 1), Some(ymd(1980, 2, 29)));
        assert_eq!(first_of_month(ymd(1980, 2, 17)), ymd(1980, 2, 1));
    }
}
