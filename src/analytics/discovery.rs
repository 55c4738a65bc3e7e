//! Discovery rate: how much listening goes to newly found tracks.
//!
//! A play is a discovery when it falls in the same month as the
//! earliest play of its `(track, artist)` pair, so every spin during
//! the month a track was found counts. Rates are the percentage of each
//! month's hours (or plays) spent on discoveries.

use super::buckets::{Bucket, Granularity};
use super::{round2, MS_PER_HOUR};
use crate::library_store::Dataset;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiscoveryRow {
    pub year_month: String,
    pub total_hours: f64,
    pub total_plays: u64,
    pub discovery_hours: f64,
    pub discovery_plays: u64,
    /// None when the month has zero hours in the denominator.
    pub discovery_rate_hours: Option<f64>,
    pub discovery_rate_plays: Option<f64>,
}

/// Monthly discovery rates, one row per month that has any plays,
/// in chronological order.
pub fn discovery_rate(dataset: &Dataset) -> Vec<DiscoveryRow> {
    let mut first_listen: HashMap<(&str, &str), NaiveDateTime> = HashMap::new();
    for play in &dataset.plays {
        let key = (play.track_name.as_str(), play.artist_name.as_str());
        first_listen
            .entry(key)
            .and_modify(|t| *t = (*t).min(play.played_at))
            .or_insert(play.played_at);
    }

    #[derive(Default)]
    struct MonthAccum {
        total_ms: u64,
        total_plays: u64,
        discovery_ms: u64,
        discovery_plays: u64,
    }
    let mut months: BTreeMap<Bucket, MonthAccum> = BTreeMap::new();
    for play in &dataset.plays {
        let key = (play.track_name.as_str(), play.artist_name.as_str());
        let bucket = Granularity::Month.bucket_of(play.played_at);
        let is_discovery = first_listen
            .get(&key)
            .map(|first| Granularity::Month.bucket_of(*first))
            == Some(bucket);
        let accum = months.entry(bucket).or_default();
        accum.total_ms += play.ms_played;
        accum.total_plays += 1;
        if is_discovery {
            accum.discovery_ms += play.ms_played;
            accum.discovery_plays += 1;
        }
    }

    months
        .into_iter()
        .map(|(bucket, accum)| {
            let total_hours = accum.total_ms as f64 / MS_PER_HOUR;
            let discovery_hours = accum.discovery_ms as f64 / MS_PER_HOUR;
            DiscoveryRow {
                year_month: bucket.label(),
                total_hours: round2(total_hours),
                total_plays: accum.total_plays,
                discovery_hours: round2(discovery_hours),
                discovery_plays: accum.discovery_plays,
                discovery_rate_hours: rate(discovery_hours, total_hours),
                discovery_rate_plays: rate(accum.discovery_plays as f64, accum.total_plays as f64),
            }
        })
        .collect()
}

fn rate(part: f64, whole: f64) -> Option<f64> {
    if whole > 0.0 {
        Some(round2(100.0 * part / whole))
    } else {
        None
    }
}
