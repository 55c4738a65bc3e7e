//! Top-artist and top-track leaderboards over an optional month range.

use super::buckets::Granularity;
use super::{round2, Metric, MonthRange, MS_PER_HOUR};
use crate::library_store::{Dataset, Play};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopArtistRow {
    pub artist_name: String,
    pub hours: f64,
    pub plays: u64,
    pub spotify_artist_id: Option<String>,
    pub image_url: Option<String>,
    /// The artist's most played track (by duration) within the range.
    pub top_track: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopTrackRow {
    pub track_name: String,
    pub artist_name: String,
    pub hours: f64,
    pub plays: u64,
    pub spotify_track_uri: Option<String>,
    pub album_image_url: Option<String>,
}

#[derive(Default)]
struct Accum {
    ms: u64,
    plays: u64,
}

/// Orders by the requested metric descending, then the other metric
/// descending, then name ascending.
fn rank_key(accum: &Accum, metric: Metric) -> (u64, u64) {
    match metric {
        Metric::Hours => (accum.ms, accum.plays),
        Metric::Plays => (accum.plays, accum.ms),
    }
}

pub fn top_artists(
    dataset: &Dataset,
    range: &MonthRange,
    metric: Metric,
    limit: usize,
) -> Vec<TopArtistRow> {
    let mut artists: BTreeMap<&str, Accum> = BTreeMap::new();
    let mut tracks_by_artist: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for play in plays_in_range(dataset, range) {
        let accum = artists.entry(&play.artist_name).or_default();
        accum.ms += play.ms_played;
        accum.plays += 1;
        *tracks_by_artist
            .entry((&play.artist_name, &play.track_name))
            .or_default() += play.ms_played;
    }

    let mut ordered: Vec<(&str, Accum)> = artists.into_iter().collect();
    ordered.sort_by(|(name_a, a), (name_b, b)| {
        rank_key(b, metric)
            .cmp(&rank_key(a, metric))
            .then_with(|| name_a.cmp(name_b))
    });

    ordered
        .into_iter()
        .take(limit)
        .map(|(artist_name, accum)| {
            let top_track = tracks_by_artist
                .range((artist_name, "")..)
                .take_while(|((a, _), _)| *a == artist_name)
                // max duration, ties to the lexicographically first track
                .min_by_key(|((_, track), ms)| (std::cmp::Reverse(**ms), *track))
                .map(|((_, track), _)| track.to_string());
            let info = dataset.artist(artist_name);
            TopArtistRow {
                artist_name: artist_name.to_string(),
                hours: round2(accum.ms as f64 / MS_PER_HOUR),
                plays: accum.plays,
                spotify_artist_id: info.and_then(|i| i.spotify_artist_id.clone()),
                image_url: info.and_then(|i| i.image_url.clone()),
                top_track,
            }
        })
        .collect()
}

pub fn top_tracks(
    dataset: &Dataset,
    range: &MonthRange,
    metric: Metric,
    limit: usize,
) -> Vec<TopTrackRow> {
    struct TrackAccum {
        totals: Accum,
        uri: Option<String>,
    }
    let mut tracks: BTreeMap<(&str, &str), TrackAccum> = BTreeMap::new();
    for play in plays_in_range(dataset, range) {
        let accum = tracks
            .entry((&play.track_name, &play.artist_name))
            .or_insert(TrackAccum {
                totals: Accum::default(),
                uri: None,
            });
        accum.totals.ms += play.ms_played;
        accum.totals.plays += 1;
        if accum.uri.is_none() {
            accum.uri = play.spotify_track_uri.clone();
        }
    }

    let mut ordered: Vec<((&str, &str), TrackAccum)> = tracks.into_iter().collect();
    ordered.sort_by(|(key_a, a), (key_b, b)| {
        rank_key(&b.totals, metric)
            .cmp(&rank_key(&a.totals, metric))
            .then_with(|| key_a.cmp(key_b))
    });

    ordered
        .into_iter()
        .take(limit)
        .map(|((track_name, artist_name), accum)| {
            let album_image_url = accum
                .uri
                .as_deref()
                .and_then(|uri| dataset.track(uri))
                .and_then(|t| t.album_image_url.clone());
            TopTrackRow {
                track_name: track_name.to_string(),
                artist_name: artist_name.to_string(),
                hours: round2(accum.totals.ms as f64 / MS_PER_HOUR),
                plays: accum.totals.plays,
                spotify_track_uri: accum.uri,
                album_image_url,
            }
        })
        .collect()
}

fn plays_in_range<'a>(
    dataset: &'a Dataset,
    range: &'a MonthRange,
) -> impl Iterator<Item = &'a Play> {
    dataset
        .plays
        .iter()
        .filter(|p| range.contains(Granularity::Month.bucket_of(p.played_at)))
}
