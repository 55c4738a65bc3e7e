//! The analytics engine: pure, read-only computations over a [`Dataset`]
//! snapshot. Each submodule is one family of computations; all of them
//! share the bucket/spine machinery in [`buckets`] and the parameter
//! types below. Nothing in here performs I/O.
//!
//! [`Dataset`]: crate::library_store::Dataset

pub mod buckets;
pub mod discovery;
pub mod error;
pub mod evolution;
pub mod genres;
pub mod leaderboard;
pub mod profile;
pub mod relevance;

pub use error::StatsError;

use buckets::{Bucket, Granularity};
use chrono::NaiveDate;
use std::str::FromStr;

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Hour-valued outputs are rounded to 2 decimal places at the edge.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Which metric a computation aggregates and ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Hours,
    Plays,
}

impl FromStr for Metric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hours" => Ok(Metric::Hours),
            "plays" => Ok(Metric::Plays),
            other => Err(StatsError::invalid_parameter(format!(
                "unknown metric {:?}, expected \"hours\" or \"plays\"",
                other
            ))),
        }
    }
}

/// An inclusive `[start, end]` bound over month buckets (`YYYY-MM`
/// labels). Either side may be absent; both absent means "all data".
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthRange {
    pub start: Option<Bucket>,
    pub end: Option<Bucket>,
}

impl MonthRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, StatsError> {
        let start = start
            .map(|s| Bucket::parse(s, Granularity::Month))
            .transpose()?;
        let end = end
            .map(|s| Bucket::parse(s, Granularity::Month))
            .transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(StatsError::invalid_parameter(format!(
                    "start {} is after end {}",
                    start.label(),
                    end.label()
                )));
            }
        }
        Ok(MonthRange { start, end })
    }

    pub fn contains(&self, month: Bucket) -> bool {
        if let Some(start) = self.start {
            if month < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if month > end {
                return false;
            }
        }
        true
    }

    /// Range check on an already-formatted `YYYY-MM` label; labels that
    /// do not parse are outside every range.
    pub fn contains_label(&self, label: &str) -> bool {
        Bucket::parse(label, Granularity::Month)
            .map(|month| self.contains(month))
            .unwrap_or(false)
    }
}

/// An inclusive `[start, end]` bound over calendar dates (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, StatsError> {
        let parse_date = |raw: &str| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                StatsError::invalid_parameter(format!(
                    "unparseable date {:?}, expected YYYY-MM-DD",
                    raw
                ))
            })
        };
        let start = start.map(parse_date).transpose()?;
        let end = end.map(parse_date).transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(StatsError::invalid_parameter(format!(
                    "start {} is after end {}",
                    start, end
                )));
            }
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start)
            && self.end.map_or(true, |end| date <= end)
    }
}

/// Validates a caller-supplied result limit.
pub fn validate_limit(limit: usize) -> Result<usize, StatsError> {
    if limit == 0 {
        return Err(StatsError::invalid_parameter("limit must be positive"));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_parses_known_values_only() {
        assert_eq!("hours".parse::<Metric>().unwrap(), Metric::Hours);
        assert_eq!("plays".parse::<Metric>().unwrap(), Metric::Plays);
        assert!("minutes".parse::<Metric>().is_err());
    }

    #[test]
    fn month_range_rejects_inverted_bounds() {
        assert!(MonthRange::parse(Some("2024-05"), Some("2024-01")).is_err());
        assert!(MonthRange::parse(Some("2024-01"), Some("2024-05")).is_ok());
        assert!(MonthRange::parse(None, None).is_ok());
    }

    #[test]
    fn month_range_contains_is_inclusive() {
        let range = MonthRange::parse(Some("2024-01"), Some("2024-03")).unwrap();
        let month = |label: &str| Bucket::parse(label, Granularity::Month).unwrap();
        assert!(range.contains(month("2024-01")));
        assert!(range.contains(month("2024-03")));
        assert!(!range.contains(month("2023-12")));
        assert!(!range.contains(month("2024-04")));
    }

    #[test]
    fn date_range_rejects_garbage() {
        assert!(DateRange::parse(Some("2024-13-01"), None).is_err());
        assert!(DateRange::parse(Some("yesterday"), None).is_err());
        assert!(DateRange::parse(Some("2024-02-29"), None).is_ok());
    }

    #[test]
    fn limit_must_be_positive() {
        assert!(validate_limit(0).is_err());
        assert_eq!(validate_limit(10).unwrap(), 10);
    }

    #[test]
    fn rounding_to_two_decimals() {
        assert_eq!(round2(0.0333333), 0.03);
        assert_eq!(round2(0.025), 0.03);
        assert_eq!(round2(12.0), 12.0);
    }
}
