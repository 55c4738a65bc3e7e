//! Calendar buckets and dense spines.
//!
//! A [`Bucket`] is a discrete calendar period identified by an integer
//! ordinal, so that "the next bucket" and "within the last N buckets"
//! are plain arithmetic regardless of granularity. Week buckets use
//! ISO-8601 numbering (Monday start); the same ISO week drives both the
//! label and the ordinal, so label order and ordinal order always agree.

use super::StatsError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
}

/// Caller-facing granularity selector; `Auto` resolves from the span of
/// the requested range (<= 62 days: day, <= 180 days: week, else month).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularitySelector {
    Fixed(Granularity),
    Auto,
}

impl FromStr for GranularitySelector {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(GranularitySelector::Fixed(Granularity::Day)),
            "week" => Ok(GranularitySelector::Fixed(Granularity::Week)),
            "month" => Ok(GranularitySelector::Fixed(Granularity::Month)),
            "quarter" => Ok(GranularitySelector::Fixed(Granularity::Quarter)),
            "auto" => Ok(GranularitySelector::Auto),
            other => Err(StatsError::invalid_parameter(format!(
                "unknown granularity {:?}, expected day|week|month|quarter|auto",
                other
            ))),
        }
    }
}

pub fn auto_granularity(start: NaiveDate, end: NaiveDate) -> Granularity {
    let span_days = (end - start).num_days();
    if span_days <= 62 {
        Granularity::Day
    } else if span_days <= 180 {
        Granularity::Week
    } else {
        Granularity::Month
    }
}

/// A calendar period at a fixed granularity. Ordering within one
/// granularity is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket {
    granularity: Granularity,
    ordinal: i64,
}

impl Granularity {
    pub fn bucket_of(self, ts: NaiveDateTime) -> Bucket {
        self.bucket_of_date(ts.date())
    }

    pub fn bucket_of_date(self, date: NaiveDate) -> Bucket {
        let ordinal = match self {
            // Proleptic-Gregorian day number; day 1 (0001-01-01) is a Monday,
            // which makes the week ordinal below a floor-to-Monday division.
            Granularity::Day => i64::from(date.num_days_from_ce()),
            Granularity::Week => (i64::from(date.num_days_from_ce()) - 1).div_euclid(7),
            Granularity::Month => i64::from(date.year()) * 12 + i64::from(date.month0()),
            Granularity::Quarter => i64::from(date.year()) * 4 + i64::from(date.month0() / 3),
        };
        Bucket {
            granularity: self,
            ordinal,
        }
    }
}

impl Bucket {
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn next(&self) -> Bucket {
        Bucket {
            granularity: self.granularity,
            ordinal: self.ordinal + 1,
        }
    }

    /// Ordinal distance (`self - earlier`), used by rolling windows.
    pub fn distance_from(&self, earlier: Bucket) -> i64 {
        self.ordinal - earlier.ordinal
    }

    /// First calendar day of the period.
    pub fn start_date(&self) -> NaiveDate {
        match self.granularity {
            Granularity::Day => from_day_number(self.ordinal),
            Granularity::Week => from_day_number(self.ordinal * 7 + 1),
            Granularity::Month => {
                let year = self.ordinal.div_euclid(12) as i32;
                let month = self.ordinal.rem_euclid(12) as u32 + 1;
                NaiveDate::from_ymd_opt(year, month, 1).expect("valid month bucket ordinal")
            }
            Granularity::Quarter => {
                let year = self.ordinal.div_euclid(4) as i32;
                let month = self.ordinal.rem_euclid(4) as u32 * 3 + 1;
                NaiveDate::from_ymd_opt(year, month, 1).expect("valid quarter bucket ordinal")
            }
        }
    }

    pub fn label(&self) -> String {
        match self.granularity {
            Granularity::Day => self.start_date().format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let iso = self.start_date().iso_week();
                format!("{:04}-W{:02}", iso.year(), iso.week())
            }
            Granularity::Month => {
                let year = self.ordinal.div_euclid(12);
                let month = self.ordinal.rem_euclid(12) + 1;
                format!("{:04}-{:02}", year, month)
            }
            Granularity::Quarter => {
                let year = self.ordinal.div_euclid(4);
                let quarter = self.ordinal.rem_euclid(4) + 1;
                format!("{}-Q{}", year, quarter)
            }
        }
    }

    /// Parses a bucket label in the granularity's canonical format.
    pub fn parse(label: &str, granularity: Granularity) -> Result<Bucket, StatsError> {
        let fail = || {
            StatsError::invalid_parameter(format!(
                "unparseable {:?} bucket label {:?}",
                granularity, label
            ))
        };
        match granularity {
            Granularity::Day => {
                let date = NaiveDate::parse_from_str(label, "%Y-%m-%d").map_err(|_| fail())?;
                Ok(granularity.bucket_of_date(date))
            }
            Granularity::Week => {
                // YYYY-Www
                let (year, week) = label.split_once("-W").ok_or_else(fail)?;
                let year: i32 = year.parse().map_err(|_| fail())?;
                let week: u32 = week.parse().map_err(|_| fail())?;
                let monday =
                    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(fail)?;
                Ok(granularity.bucket_of_date(monday))
            }
            Granularity::Month => {
                let (year, month) = label.split_once('-').ok_or_else(fail)?;
                let year: i32 = year.parse().map_err(|_| fail())?;
                let month: u32 = month.parse().map_err(|_| fail())?;
                if !(1..=12).contains(&month) {
                    return Err(fail());
                }
                let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(fail)?;
                Ok(granularity.bucket_of_date(first))
            }
            Granularity::Quarter => {
                let (year, quarter) = label.split_once("-Q").ok_or_else(fail)?;
                let year: i32 = year.parse().map_err(|_| fail())?;
                let quarter: u32 = quarter.parse().map_err(|_| fail())?;
                if !(1..=4).contains(&quarter) {
                    return Err(fail());
                }
                let first =
                    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1).ok_or_else(fail)?;
                Ok(granularity.bucket_of_date(first))
            }
        }
    }
}

fn from_day_number(days_from_ce: i64) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days_from_ce as i32).expect("valid day bucket ordinal")
}

/// Every bucket from `first` to `last` inclusive, with no gaps. Both
/// ends must share a granularity; callers always derive them from one.
pub fn spine(first: Bucket, last: Bucket) -> Vec<Bucket> {
    debug_assert_eq!(first.granularity, last.granularity);
    (first.ordinal..=last.ordinal)
        .map(|ordinal| Bucket {
            granularity: first.granularity,
            ordinal,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_labels_and_ordering() {
        let jan = Granularity::Month.bucket_of_date(date(2024, 1, 15));
        let feb = Granularity::Month.bucket_of_date(date(2024, 2, 1));
        assert_eq!(jan.label(), "2024-01");
        assert_eq!(feb.label(), "2024-02");
        assert!(jan < feb);
        assert_eq!(jan.next(), feb);
    }

    #[test]
    fn quarter_ordinal_arithmetic_crosses_years() {
        let q4_2023 = Granularity::Quarter.bucket_of_date(date(2023, 11, 1));
        let q1_2024 = Granularity::Quarter.bucket_of_date(date(2024, 2, 1));
        assert_eq!(q4_2023.label(), "2023-Q4");
        assert_eq!(q1_2024.label(), "2024-Q1");
        assert_eq!(q1_2024.distance_from(q4_2023), 1);

        let q3_2024 = Granularity::Quarter.bucket_of_date(date(2024, 7, 31));
        // "within the last 4 quarters" of 2024-Q3 reaches back to 2023-Q4
        assert_eq!(q3_2024.distance_from(q4_2023), 3);
    }

    #[test]
    fn iso_week_labels_at_year_boundary() {
        // 2024-12-30 (Monday) and 2025-01-01 both fall in ISO week 2025-W01
        let a = Granularity::Week.bucket_of_date(date(2024, 12, 30));
        let b = Granularity::Week.bucket_of_date(date(2025, 1, 1));
        assert_eq!(a, b);
        assert_eq!(a.label(), "2025-W01");

        // 2023-01-01 (Sunday) belongs to ISO week 2022-W52
        let c = Granularity::Week.bucket_of_date(date(2023, 1, 1));
        assert_eq!(c.label(), "2022-W52");
    }

    #[test]
    fn week_buckets_start_on_monday() {
        let sunday = Granularity::Week.bucket_of_date(date(2024, 1, 7));
        let monday_before = Granularity::Week.bucket_of_date(date(2024, 1, 1));
        let monday_after = Granularity::Week.bucket_of_date(date(2024, 1, 8));
        assert_eq!(sunday, monday_before);
        assert_ne!(sunday, monday_after);
        assert_eq!(sunday.start_date(), date(2024, 1, 1));
    }

    #[test]
    fn spine_is_dense_between_bounds() {
        let first = Granularity::Month.bucket_of_date(date(2023, 11, 3));
        let last = Granularity::Month.bucket_of_date(date(2024, 2, 27));
        let labels: Vec<String> = spine(first, last).iter().map(|b| b.label()).collect();
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn spine_density_matches_calendar_distance_across_granularities() {
        let start = date(2023, 2, 10);
        let end = date(2024, 6, 20);
        for granularity in [
            Granularity::Day,
            Granularity::Week,
            Granularity::Month,
            Granularity::Quarter,
        ] {
            let first = granularity.bucket_of_date(start);
            let last = granularity.bucket_of_date(end);
            let spine = spine(first, last);
            assert_eq!(spine.len() as i64, last.distance_from(first) + 1);
            // No gaps, strictly increasing
            for pair in spine.windows(2) {
                assert_eq!(pair[0].next(), pair[1]);
            }
        }
    }

    #[test]
    fn labels_parse_back_to_the_same_bucket() {
        let cases = [
            (Granularity::Day, "2024-02-29"),
            (Granularity::Week, "2024-W09"),
            (Granularity::Month, "2024-02"),
            (Granularity::Quarter, "2024-Q1"),
        ];
        for (granularity, label) in cases {
            let bucket = Bucket::parse(label, granularity).unwrap();
            assert_eq!(bucket.label(), label);
        }
    }

    #[test]
    fn parse_rejects_malformed_labels() {
        assert!(Bucket::parse("2024-13", Granularity::Month).is_err());
        assert!(Bucket::parse("2024-Q5", Granularity::Quarter).is_err());
        assert!(Bucket::parse("2024-W60", Granularity::Week).is_err());
        assert!(Bucket::parse("02-2024", Granularity::Month).is_err());
        assert!(Bucket::parse("2024-02-30", Granularity::Day).is_err());
    }

    #[test]
    fn auto_granularity_thresholds() {
        let start = date(2024, 1, 1);
        assert_eq!(auto_granularity(start, date(2024, 3, 3)), Granularity::Day);
        assert_eq!(auto_granularity(start, date(2024, 3, 4)), Granularity::Week);
        assert_eq!(auto_granularity(start, date(2024, 6, 29)), Granularity::Week);
        assert_eq!(
            auto_granularity(start, date(2024, 6, 30)),
            Granularity::Month
        );
    }
}
