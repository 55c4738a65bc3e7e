//! Whole-history profile aggregates: the summary card, listening
//! trends over time, and the habit breakdowns (day of week, hour of
//! day, release year/decade).

use super::buckets::{spine, Granularity};
use super::{round2, DateRange, MonthRange, StatsError, MS_PER_HOUR};
use crate::library_store::{Dataset, Play};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

const PLAYED_AT_OUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub total_hours: f64,
    pub total_plays: u64,
    pub unique_tracks: u64,
    pub unique_artists: u64,
    pub first_played_at: Option<String>,
    pub last_played_at: Option<String>,
}

pub fn summary(dataset: &Dataset, range: &DateRange) -> Summary {
    let mut total_ms = 0u64;
    let mut total_plays = 0u64;
    let mut tracks: HashSet<(&str, &str)> = HashSet::new();
    let mut artists: HashSet<&str> = HashSet::new();
    let mut first = None;
    let mut last = None;
    for play in plays_in_range(dataset, range) {
        total_ms += play.ms_played;
        total_plays += 1;
        tracks.insert((&play.track_name, &play.artist_name));
        artists.insert(&play.artist_name);
        first = Some(first.map_or(play.played_at, |f: chrono::NaiveDateTime| {
            f.min(play.played_at)
        }));
        last = Some(last.map_or(play.played_at, |l: chrono::NaiveDateTime| {
            l.max(play.played_at)
        }));
    }
    Summary {
        total_hours: round2(total_ms as f64 / MS_PER_HOUR),
        total_plays,
        unique_tracks: tracks.len() as u64,
        unique_artists: artists.len() as u64,
        first_played_at: first.map(|t| t.format(PLAYED_AT_OUT_FORMAT).to_string()),
        last_played_at: last.map(|t| t.format(PLAYED_AT_OUT_FORMAT).to_string()),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendRow {
    pub bucket: String,
    pub hours: f64,
    pub plays: u64,
    pub unique_tracks: u64,
    pub unique_artists: u64,
}

/// Per-bucket listening volume over the dense spine from the earliest
/// to the latest play in range. Buckets without plays carry zeros.
pub fn trends(dataset: &Dataset, range: &DateRange, granularity: Granularity) -> Vec<TrendRow> {
    #[derive(Default)]
    struct BucketAccum<'a> {
        ms: u64,
        plays: u64,
        tracks: HashSet<(&'a str, &'a str)>,
        artists: HashSet<&'a str>,
    }
    let mut buckets: BTreeMap<super::buckets::Bucket, BucketAccum> = BTreeMap::new();
    for play in plays_in_range(dataset, range) {
        let accum = buckets
            .entry(granularity.bucket_of(play.played_at))
            .or_default();
        accum.ms += play.ms_played;
        accum.plays += 1;
        accum.tracks.insert((&play.track_name, &play.artist_name));
        accum.artists.insert(&play.artist_name);
    }
    let (Some(&first), Some(&last)) = (
        buckets.keys().next(),
        buckets.keys().next_back(),
    ) else {
        return Vec::new();
    };
    spine(first, last)
        .into_iter()
        .map(|bucket| match buckets.get(&bucket) {
            Some(accum) => TrendRow {
                bucket: bucket.label(),
                hours: round2(accum.ms as f64 / MS_PER_HOUR),
                plays: accum.plays,
                unique_tracks: accum.tracks.len() as u64,
                unique_artists: accum.artists.len() as u64,
            },
            None => TrendRow {
                bucket: bucket.label(),
                hours: 0.0,
                plays: 0,
                unique_tracks: 0,
                unique_artists: 0,
            },
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DowRow {
    pub year_month: String,
    pub dow: u32,
    pub dow_name: &'static str,
    pub hours: f64,
    pub plays: u64,
}

/// Hours and plays per `(month, day of week)`, dow 0 = Sunday. Only
/// combinations with plays appear, ordered by month then dow.
pub fn day_of_week_profile(dataset: &Dataset, range: &MonthRange) -> Vec<DowRow> {
    let mut totals: BTreeMap<(super::buckets::Bucket, u32), (f64, u64)> = BTreeMap::new();
    for play in &dataset.plays {
        let bucket = Granularity::Month.bucket_of(play.played_at);
        if !range.contains(bucket) {
            continue;
        }
        let entry = totals.entry((bucket, play.dow())).or_insert((0.0, 0));
        entry.0 += play.ms_played as f64 / MS_PER_HOUR;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|((bucket, dow), (hours, plays))| DowRow {
            year_month: bucket.label(),
            dow,
            dow_name: Play::dow_name_of(dow),
            hours: round2(hours),
            plays,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HourRow {
    pub hour: u32,
    pub hours: f64,
    pub plays: u64,
}

/// Hours and plays per hour of day, all 24 rows, 0 = midnight.
pub fn hour_of_day_profile(dataset: &Dataset, range: &MonthRange) -> Vec<HourRow> {
    let mut ms = [0u64; 24];
    let mut plays = [0u64; 24];
    for play in &dataset.plays {
        if !range.contains(Granularity::Month.bucket_of(play.played_at)) {
            continue;
        }
        let h = play.hour() as usize;
        ms[h] += play.ms_played;
        plays[h] += 1;
    }
    (0..24)
        .map(|h| HourRow {
            hour: h as u32,
            hours: round2(ms[h] as f64 / MS_PER_HOUR),
            plays: plays[h],
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseGroupBy {
    Year,
    Decade,
}

impl FromStr for ReleaseGroupBy {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(ReleaseGroupBy::Year),
            "decade" => Ok(ReleaseGroupBy::Decade),
            other => Err(StatsError::invalid_parameter(format!(
                "unknown groupBy {:?}, expected year|decade",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReleaseYearRow {
    pub year: i32,
    pub hours: f64,
    pub plays: u64,
    pub unique_tracks: u64,
}

/// Listening volume by track release year or decade. Plays whose track
/// has no known release year are left out.
pub fn release_years(
    dataset: &Dataset,
    range: &MonthRange,
    group_by: ReleaseGroupBy,
) -> Vec<ReleaseYearRow> {
    struct YearAccum<'a> {
        ms: u64,
        plays: u64,
        tracks: HashSet<&'a str>,
    }
    let mut years: BTreeMap<i32, YearAccum> = BTreeMap::new();
    for play in &dataset.plays {
        if !range.contains(Granularity::Month.bucket_of(play.played_at)) {
            continue;
        }
        let Some(year) = release_group_of(dataset, play, group_by) else {
            continue;
        };
        let uri = play.spotify_track_uri.as_deref().unwrap_or_default();
        let accum = years.entry(year).or_insert(YearAccum {
            ms: 0,
            plays: 0,
            tracks: HashSet::new(),
        });
        accum.ms += play.ms_played;
        accum.plays += 1;
        accum.tracks.insert(uri);
    }
    years
        .into_iter()
        .map(|(year, accum)| ReleaseYearRow {
            year,
            hours: round2(accum.ms as f64 / MS_PER_HOUR),
            plays: accum.plays,
            unique_tracks: accum.tracks.len() as u64,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecadeEvolutionRow {
    pub year_month: String,
    pub decade: i32,
    pub hours: f64,
    pub plays: u64,
}

/// Monthly point totals per release decade, 1950s onward. Only
/// occupied `(month, decade)` cells appear, ordered by month then
/// decade.
pub fn decade_evolution(dataset: &Dataset) -> Vec<DecadeEvolutionRow> {
    let mut totals: BTreeMap<(super::buckets::Bucket, i32), (u64, u64)> = BTreeMap::new();
    for play in &dataset.plays {
        let Some(decade) = release_group_of(dataset, play, ReleaseGroupBy::Decade) else {
            continue;
        };
        if decade < 1950 {
            continue;
        }
        let bucket = Granularity::Month.bucket_of(play.played_at);
        let entry = totals.entry((bucket, decade)).or_insert((0, 0));
        entry.0 += play.ms_played;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|((bucket, decade), (ms, plays))| DecadeEvolutionRow {
            year_month: bucket.label(),
            decade,
            hours: round2(ms as f64 / MS_PER_HOUR),
            plays,
        })
        .collect()
}

fn plays_in_range<'a>(
    dataset: &'a Dataset,
    range: &'a DateRange,
) -> impl Iterator<Item = &'a Play> {
    dataset.plays.iter().filter(|p| range.contains(p.date()))
}

fn release_group_of(dataset: &Dataset, play: &Play, group_by: ReleaseGroupBy) -> Option<i32> {
    let info = dataset.track(play.spotify_track_uri.as_deref()?)?;
    match group_by {
        ReleaseGroupBy::Year => info.release_year,
        ReleaseGroupBy::Decade => info
            .release_decade
            .or_else(|| info.release_year.map(|y| y / 10 * 10)),
    }
}
