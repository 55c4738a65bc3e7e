//! Genre attribution.
//!
//! An artist carries a list of subgenres; a mapping table folds those
//! into broad genres. The broad-genre time series splits a play's
//! duration evenly across the distinct broad genres it touches, so
//! hours stay conserved, but credits the whole play to each genre, so
//! play counts answer "how many plays touched this genre". The flat
//! breakdowns intentionally do NOT split: there each expanded genre row
//! carries the full duration, which is the shape the original charts
//! expect.

use super::buckets::Granularity;
use super::evolution::Contribution;
use super::{round2, MonthRange, MS_PER_HOUR};
use crate::library_store::{Dataset, Play};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubgenreRow {
    pub genre: String,
    pub broad_genre: String,
    pub hours: f64,
    pub plays: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BroadGenreRow {
    pub broad_genre: String,
    pub hours: f64,
    pub plays: u64,
}

/// Distinct broad genres a play touches, after mapping and exclusion.
/// Unmapped subgenres pass through under their own name. Plays whose
/// artist has no genre data touch nothing.
pub fn broad_genres_of(play: &Play, dataset: &Dataset, excluded: &HashSet<String>) -> Vec<String> {
    let Some(artist) = dataset.artist(&play.artist_name) else {
        return Vec::new();
    };
    let set: BTreeSet<String> = artist
        .subgenres
        .iter()
        .map(|sub| map_broad(dataset, sub))
        .filter(|broad| !excluded.contains(broad))
        .collect();
    set.into_iter().collect()
}

fn map_broad(dataset: &Dataset, subgenre: &str) -> String {
    dataset
        .genre_mappings
        .get(subgenre)
        .cloned()
        .unwrap_or_else(|| subgenre.to_string())
}

/// Monthly per-broad-genre contributions for the evolution series.
/// Hours are split across the play's `m` distinct broad genres; each
/// genre still gets the whole play.
pub fn evolution_contributions(dataset: &Dataset, excluded: &HashSet<String>) -> Vec<Contribution> {
    let mut out = Vec::new();
    for play in &dataset.plays {
        let genres = broad_genres_of(play, dataset, excluded);
        if genres.is_empty() {
            continue;
        }
        let split_hours = play.ms_played as f64 / MS_PER_HOUR / genres.len() as f64;
        let bucket = Granularity::Month.bucket_of(play.played_at);
        for genre in genres {
            out.push(Contribution {
                bucket,
                entity: genre,
                hours: split_hours,
                plays: 1.0,
            });
        }
    }
    out
}

/// Flat subgenre breakdown over an optional month range, un-split:
/// every `(subgenre, play)` pair counts the play's full duration.
/// Sorted by hours descending, genre name ascending on ties.
pub fn subgenre_breakdown(
    dataset: &Dataset,
    range: &MonthRange,
    excluded: &HashSet<String>,
) -> Vec<SubgenreRow> {
    let mut totals: BTreeMap<(String, String), (f64, u64)> = BTreeMap::new();
    for play in plays_in_range(dataset, range) {
        let Some(artist) = dataset.artist(&play.artist_name) else {
            continue;
        };
        for sub in &artist.subgenres {
            let broad = map_broad(dataset, sub);
            if excluded.contains(&broad) {
                continue;
            }
            let entry = totals.entry((sub.clone(), broad)).or_insert((0.0, 0));
            entry.0 += play.ms_played as f64 / MS_PER_HOUR;
            entry.1 += 1;
        }
    }
    let mut rows: Vec<SubgenreRow> = totals
        .into_iter()
        .map(|((genre, broad_genre), (hours, plays))| SubgenreRow {
            genre,
            broad_genre,
            hours: round2(hours),
            plays,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.hours
            .partial_cmp(&a.hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.genre.cmp(&b.genre))
    });
    rows
}

/// Broad-genre totals over an optional month range, un-split across the
/// expanded subgenre rows. Sorted by hours descending.
pub fn broad_genre_totals(
    dataset: &Dataset,
    range: &MonthRange,
    excluded: &HashSet<String>,
) -> Vec<BroadGenreRow> {
    let mut totals: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for play in plays_in_range(dataset, range) {
        let Some(artist) = dataset.artist(&play.artist_name) else {
            continue;
        };
        for sub in &artist.subgenres {
            let broad = map_broad(dataset, sub);
            if excluded.contains(&broad) {
                continue;
            }
            let entry = totals.entry(broad).or_insert((0.0, 0));
            entry.0 += play.ms_played as f64 / MS_PER_HOUR;
            entry.1 += 1;
        }
    }
    let mut rows: Vec<BroadGenreRow> = totals
        .into_iter()
        .map(|(broad_genre, (hours, plays))| BroadGenreRow {
            broad_genre,
            hours: round2(hours),
            plays,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.hours
            .partial_cmp(&a.hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.broad_genre.cmp(&b.broad_genre))
    });
    rows
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_store::{ArtistInfo, Dataset};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn play(artist: &str, ms: u64, y: i32, m: u32) -> Play {
        Play {
            played_at: NaiveDate::from_ymd_opt(y, m, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            ms_played: ms,
            track_name: "track".to_string(),
            artist_name: artist.to_string(),
            spotify_track_uri: None,
        }
    }

    fn artist(subgenres: &[&str]) -> ArtistInfo {
        ArtistInfo {
            subgenres: subgenres.iter().map(|s| s.to_string()).collect(),
            spotify_artist_id: None,
            image_url: None,
        }
    }

    fn dataset() -> Dataset {
        let mut artists = HashMap::new();
        artists.insert("Duo".to_string(), artist(&["indie rock", "synthpop"]));
        artists.insert("Mono".to_string(), artist(&["indie rock"]));
        artists.insert("Naked".to_string(), artist(&[]));
        artists.insert("Santa".to_string(), artist(&["christmas"]));
        let mut genre_mappings = HashMap::new();
        genre_mappings.insert("indie rock".to_string(), "Rock".to_string());
        genre_mappings.insert("synthpop".to_string(), "Pop".to_string());
        genre_mappings.insert("christmas".to_string(), "Holiday".to_string());
        Dataset {
            plays: vec![
                play("Duo", 3_600_000, 2024, 1),
                play("Mono", 1_800_000, 2024, 1),
                play("Naked", 7_200_000, 2024, 1),
                play("Santa", 3_600_000, 2024, 2),
            ],
            artists,
            tracks: HashMap::new(),
            genre_mappings,
        }
    }

    fn excluded() -> HashSet<String> {
        ["Holiday".to_string()].into_iter().collect()
    }

    #[test]
    fn split_hours_conserve_total_duration() {
        let contributions = evolution_contributions(&dataset(), &HashSet::new());
        let total_hours: f64 = contributions.iter().map(|c| c.hours).sum();
        // Naked has no genres and contributes nothing; the rest sum to
        // 1.0 + 0.5 + 1.0 hours regardless of how many genres split them
        assert!((total_hours - 2.5).abs() < 1e-9);
    }

    #[test]
    fn each_touched_genre_gets_the_whole_play() {
        let contributions = evolution_contributions(&dataset(), &excluded());
        // Only Duo's play touches Pop; it carries a split half hour but
        // a whole play
        let pop: Vec<&Contribution> = contributions
            .iter()
            .filter(|c| c.entity == "Pop")
            .collect();
        assert_eq!(pop.len(), 1);
        assert!((pop[0].hours - 0.5).abs() < 1e-9);
        assert_eq!(pop[0].plays, 1.0);
        // Rock gets whole plays from both Duo (split) and Mono (un-split)
        let rock_plays: f64 = contributions
            .iter()
            .filter(|c| c.entity == "Rock")
            .map(|c| c.plays)
            .sum();
        assert_eq!(rock_plays, 2.0);
    }

    #[test]
    fn excluded_genres_never_appear() {
        let contributions = evolution_contributions(&dataset(), &excluded());
        assert!(contributions.iter().all(|c| c.entity != "Holiday"));
        let rows = broad_genre_totals(&dataset(), &MonthRange::default(), &excluded());
        assert!(rows.iter().all(|r| r.broad_genre != "Holiday"));
    }

    #[test]
    fn unmapped_subgenres_pass_through() {
        let mut ds = dataset();
        ds.genre_mappings.remove("synthpop");
        let genres = broad_genres_of(&ds.plays[0], &ds, &HashSet::new());
        assert_eq!(genres, vec!["Rock".to_string(), "synthpop".to_string()]);
    }

    #[test]
    fn duplicate_broad_mappings_collapse_for_the_split() {
        let mut ds = dataset();
        ds.genre_mappings
            .insert("synthpop".to_string(), "Rock".to_string());
        // Both of Duo's subgenres now map to Rock: m = 1, no split
        let genres = broad_genres_of(&ds.plays[0], &ds, &HashSet::new());
        assert_eq!(genres, vec!["Rock".to_string()]);
    }

    #[test]
    fn flat_breakdown_keeps_full_duration_per_subgenre_row() {
        let rows = subgenre_breakdown(&dataset(), &MonthRange::default(), &excluded());
        let indie = rows.iter().find(|r| r.genre == "indie rock").unwrap();
        // Duo's 1h + Mono's 0.5h, each at full duration
        assert_eq!(indie.hours, 1.5);
        assert_eq!(indie.plays, 2);
        assert_eq!(indie.broad_genre, "Rock");
        let synth = rows.iter().find(|r| r.genre == "synthpop").unwrap();
        assert_eq!(synth.hours, 1.0);
    }

    #[test]
    fn month_range_bounds_are_inclusive() {
        let range = MonthRange::parse(Some("2024-02"), Some("2024-02")).unwrap();
        let rows = broad_genre_totals(&dataset(), &range, &HashSet::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].broad_genre, "Holiday");
    }
}
