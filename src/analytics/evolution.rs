//! Generic bucket-by-entity aggregation grid.
//!
//! Every time-series endpoint (artist evolution, genre evolution,
//! momentum) is the same computation: scatter per-play contributions
//! onto a dense bucket spine, then read the grid back through a window
//! mode. Cumulative and rolling reads come from prefix sums, so a whole
//! grid materializes in one pass over the contributions.

use super::buckets::{spine, Bucket, Granularity};
use super::{genres, relevance, round2, Metric, MS_PER_HOUR};
use crate::library_store::Dataset;
use serde::Serialize;
use std::collections::BTreeMap;

/// One play's share attributed to one entity in one bucket. Genre
/// splitting produces fractional `hours` with whole `plays`; artist
/// series keep both whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub bucket: Bucket,
    pub entity: String,
    pub hours: f64,
    pub plays: f64,
}

/// How a grid cell is read back from the raw per-bucket values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// The bucket's own total.
    Point,
    /// Running total from the first bucket through this one.
    Cumulative,
    /// Total over this bucket and the `n - 1` preceding ones.
    Rolling(usize),
}

/// Dense `bucket x entity` totals with per-bucket ranks.
///
/// Entities are sorted ascending by name; buckets ascending in time.
/// Ranks are 1-based, by value descending with ties broken by entity
/// name ascending, and only assigned where the value is positive.
pub struct EvolutionGrid {
    buckets: Vec<Bucket>,
    entities: Vec<String>,
    hours: Vec<Vec<f64>>,
    plays: Vec<Vec<f64>>,
    hours_rank: Vec<Vec<Option<u32>>>,
    plays_rank: Vec<Vec<Option<u32>>>,
}

impl EvolutionGrid {
    /// Builds the grid over the dense spine from the earliest to the
    /// latest contributed bucket. Returns `None` when there are no
    /// contributions at all.
    pub fn build(contributions: &[Contribution], mode: WindowMode) -> Option<EvolutionGrid> {
        let first = contributions.iter().map(|c| c.bucket).min()?;
        let last = contributions.iter().map(|c| c.bucket).max()?;
        Some(Self::build_on_spine(contributions, spine(first, last), mode))
    }

    /// Same as [`build`](Self::build) but over a caller-provided spine.
    /// Contributions outside the spine are dropped.
    pub fn build_on_spine(
        contributions: &[Contribution],
        buckets: Vec<Bucket>,
        mode: WindowMode,
    ) -> EvolutionGrid {
        // BTreeSet dedupes and yields entities in ascending name order
        let entities: Vec<String> = contributions
            .iter()
            .map(|c| c.entity.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let bucket_index: BTreeMap<Bucket, usize> = buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (*b, i))
            .collect();
        let entity_index: BTreeMap<&str, usize> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.as_str(), i))
            .collect();

        let mut hours = vec![vec![0.0; entities.len()]; buckets.len()];
        let mut plays = vec![vec![0.0; entities.len()]; buckets.len()];
        for c in contributions {
            let (Some(&bi), Some(&ei)) = (
                bucket_index.get(&c.bucket),
                entity_index.get(c.entity.as_str()),
            ) else {
                continue;
            };
            hours[bi][ei] += c.hours;
            plays[bi][ei] += c.plays;
        }

        apply_window(&mut hours, mode);
        apply_window(&mut plays, mode);

        let hours_rank = rank_rows(&hours, &entities);
        let plays_rank = rank_rows(&plays, &entities);

        EvolutionGrid {
            buckets,
            entities,
            hours,
            plays,
            hours_rank,
            plays_rank,
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn hours(&self, bucket_idx: usize, entity_idx: usize) -> f64 {
        round2(self.hours[bucket_idx][entity_idx])
    }

    pub fn plays(&self, bucket_idx: usize, entity_idx: usize) -> f64 {
        self.plays[bucket_idx][entity_idx]
    }

    pub fn hours_rank(&self, bucket_idx: usize, entity_idx: usize) -> Option<u32> {
        self.hours_rank[bucket_idx][entity_idx]
    }

    pub fn plays_rank(&self, bucket_idx: usize, entity_idx: usize) -> Option<u32> {
        self.plays_rank[bucket_idx][entity_idx]
    }

    /// Drops every entity not named in `keep`, preserving grid order.
    /// Ranks are kept as computed over the full entity population.
    pub fn retain_entities(&mut self, keep: &std::collections::HashSet<String>) {
        let kept: Vec<usize> = (0..self.entities.len())
            .filter(|i| keep.contains(&self.entities[*i]))
            .collect();
        self.entities = kept.iter().map(|&i| self.entities[i].clone()).collect();
        for row in &mut self.hours {
            *row = kept.iter().map(|&i| row[i]).collect();
        }
        for row in &mut self.plays {
            *row = kept.iter().map(|&i| row[i]).collect();
        }
        for row in &mut self.hours_rank {
            *row = kept.iter().map(|&i| row[i]).collect();
        }
        for row in &mut self.plays_rank {
            *row = kept.iter().map(|&i| row[i]).collect();
        }
    }
}

/// Rewrites point rows in place according to the window mode. For
/// `Rolling(n)` each row becomes the sum of itself and the preceding
/// `n - 1` rows, computed from running prefix sums.
fn apply_window(rows: &mut [Vec<f64>], mode: WindowMode) {
    match mode {
        WindowMode::Point => {}
        WindowMode::Cumulative => {
            for bi in 1..rows.len() {
                for ei in 0..rows[bi].len() {
                    rows[bi][ei] += rows[bi - 1][ei];
                }
            }
        }
        WindowMode::Rolling(n) => {
            let n = n.max(1);
            for bi in 1..rows.len() {
                for ei in 0..rows[bi].len() {
                    rows[bi][ei] += rows[bi - 1][ei];
                }
            }
            // prefix[bi] - prefix[bi - n] leaves exactly the last n rows;
            // reverse order so earlier rows are still prefixes when read
            for bi in (n..rows.len()).rev() {
                for ei in 0..rows[bi].len() {
                    rows[bi][ei] -= rows[bi - n][ei];
                }
            }
        }
    }
}

/// 1-based dense-index ranks per row; positive values only, value
/// descending, entity name ascending on ties.
fn rank_rows(rows: &[Vec<f64>], entities: &[String]) -> Vec<Vec<Option<u32>>> {
    rows.iter()
        .map(|row| {
            let mut order: Vec<usize> = (0..row.len()).filter(|&i| row[i] > 0.0).collect();
            order.sort_by(|&a, &b| {
                row[b]
                    .partial_cmp(&row[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| entities[a].cmp(&entities[b]))
            });
            let mut ranks = vec![None; row.len()];
            for (rank, &i) in order.iter().enumerate() {
                ranks[i] = Some(rank as u32 + 1);
            }
            ranks
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArtistEvolutionRow {
    pub year_month: String,
    pub artist_name: String,
    pub hours: f64,
    pub plays: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenreEvolutionRow {
    pub year_month: String,
    pub genre: String,
    pub hours: f64,
    pub plays: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MomentumRow {
    pub quarter: String,
    pub artist_name: String,
    pub hours: f64,
    pub plays: u64,
    pub hours_rank: Option<u32>,
    pub plays_rank: Option<u32>,
}

fn artist_contributions(dataset: &Dataset, granularity: Granularity) -> Vec<Contribution> {
    dataset
        .plays
        .iter()
        .map(|play| Contribution {
            bucket: granularity.bucket_of(play.played_at),
            entity: play.artist_name.clone(),
            hours: play.ms_played as f64 / MS_PER_HOUR,
            plays: 1.0,
        })
        .collect()
}

/// Cumulative monthly hours and plays per artist, restricted to the
/// union of artists that ever ranked top 15 by hours or by plays in
/// some month. Rows where both running totals are still zero are
/// dropped; within a month, rows are ordered by hours descending.
pub fn artist_evolution(dataset: &Dataset) -> Vec<ArtistEvolutionRow> {
    let contributions = artist_contributions(dataset, Granularity::Month);
    let Some(mut grid) = EvolutionGrid::build(&contributions, WindowMode::Cumulative) else {
        return Vec::new();
    };
    let keep = relevance::union_top_k(&grid, relevance::UNION_TOP_K);
    grid.retain_entities(&keep);
    collect_rows(&grid, |bucket, entity, hours, plays| ArtistEvolutionRow {
        year_month: bucket,
        artist_name: entity,
        hours,
        plays,
    })
}

/// Cumulative monthly hours and plays per broad genre, top-15-union
/// filtered like [`artist_evolution`]. Hours are attribution-split,
/// plays are whole per touched genre.
pub fn genre_evolution(
    dataset: &Dataset,
    excluded: &std::collections::HashSet<String>,
) -> Vec<GenreEvolutionRow> {
    let contributions = genres::evolution_contributions(dataset, excluded);
    let Some(mut grid) = EvolutionGrid::build(&contributions, WindowMode::Cumulative) else {
        return Vec::new();
    };
    let keep = relevance::union_top_k(&grid, relevance::UNION_TOP_K);
    grid.retain_entities(&keep);
    collect_rows(&grid, |bucket, entity, hours, plays| GenreEvolutionRow {
        year_month: bucket,
        genre: entity,
        hours,
        plays,
    })
}

/// Rolling four-quarter totals and ranks for every artist that ever
/// held a top-10 hours rank in some quarter. Ranks are computed against
/// the whole field before the cut, so a kept artist's rank in a weak
/// quarter can exceed 10.
pub fn artist_momentum(dataset: &Dataset) -> Vec<MomentumRow> {
    let contributions = artist_contributions(dataset, Granularity::Quarter);
    let Some(mut grid) = EvolutionGrid::build(&contributions, WindowMode::Rolling(4)) else {
        return Vec::new();
    };
    let keep = relevance::top_k_by(&grid, Metric::Hours, relevance::SINGLE_METRIC_TOP_K);
    grid.retain_entities(&keep);

    let mut rows = Vec::new();
    for (bi, bucket) in grid.buckets().iter().enumerate() {
        for ei in 0..grid.entities().len() {
            let hours = grid.hours(bi, ei);
            let plays = grid.plays(bi, ei);
            if hours <= 0.0 && plays <= 0.0 {
                continue;
            }
            rows.push(MomentumRow {
                quarter: bucket.label(),
                artist_name: grid.entities()[ei].clone(),
                hours,
                plays: plays.round() as u64,
                hours_rank: grid.hours_rank(bi, ei),
                plays_rank: grid.plays_rank(bi, ei),
            });
        }
    }
    rows.sort_by(|a, b| {
        a.quarter
            .cmp(&b.quarter)
            .then_with(|| {
                b.hours
                    .partial_cmp(&a.hours)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.artist_name.cmp(&b.artist_name))
    });
    rows
}

fn collect_rows<R>(
    grid: &EvolutionGrid,
    make: impl Fn(String, String, f64, u64) -> R,
) -> Vec<R>
where
    R: SeriesRow,
{
    let mut rows = Vec::new();
    for (bi, bucket) in grid.buckets().iter().enumerate() {
        for ei in 0..grid.entities().len() {
            let hours = grid.hours(bi, ei);
            let plays = grid.plays(bi, ei);
            if hours <= 0.0 && plays <= 0.0 {
                continue;
            }
            rows.push(make(
                bucket.label(),
                grid.entities()[ei].clone(),
                hours,
                plays.round() as u64,
            ));
        }
    }
    rows.sort_by(|a, b| {
        a.bucket_label()
            .cmp(b.bucket_label())
            .then_with(|| {
                b.hours_value()
                    .partial_cmp(&a.hours_value())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.entity_name().cmp(b.entity_name()))
    });
    rows
}

trait SeriesRow {
    fn bucket_label(&self) -> &str;
    fn entity_name(&self) -> &str;
    fn hours_value(&self) -> f64;
}

impl SeriesRow for ArtistEvolutionRow {
    fn bucket_label(&self) -> &str {
        &self.year_month
    }
    fn entity_name(&self) -> &str {
        &self.artist_name
    }
    fn hours_value(&self) -> f64 {
        self.hours
    }
}

impl SeriesRow for GenreEvolutionRow {
    fn bucket_label(&self) -> &str {
        &self.year_month
    }
    fn entity_name(&self) -> &str {
        &self.genre
    }
    fn hours_value(&self) -> f64 {
        self.hours
    }
}
