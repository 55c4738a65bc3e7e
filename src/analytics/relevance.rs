//! Selecting which entities an evolution series keeps.
//!
//! A full history mentions thousands of artists; the series only charts
//! the ones that ever mattered. An entity qualifies by ranking in the
//! top K of some bucket, on the grid's windowed values. Once qualified
//! it is retained for every bucket, so a one-era favorite stays visible
//! after bigger names eclipse it.

use super::evolution::EvolutionGrid;
use super::Metric;
use std::collections::HashSet;

pub const UNION_TOP_K: usize = 15;
pub const SINGLE_METRIC_TOP_K: usize = 10;

/// Entities ranked in the top `k` by hours or by plays in any bucket.
pub fn union_top_k(grid: &EvolutionGrid, k: usize) -> HashSet<String> {
    let mut keep = top_k_by(grid, Metric::Hours, k);
    keep.extend(top_k_by(grid, Metric::Plays, k));
    keep
}

/// Entities ranked in the top `k` by one metric in any bucket.
pub fn top_k_by(grid: &EvolutionGrid, metric: Metric, k: usize) -> HashSet<String> {
    let mut keep = HashSet::new();
    for bi in 0..grid.buckets().len() {
        for (ei, entity) in grid.entities().iter().enumerate() {
            if keep.contains(entity) {
                continue;
            }
            let rank = match metric {
                Metric::Hours => grid.hours_rank(bi, ei),
                Metric::Plays => grid.plays_rank(bi, ei),
            };
            if rank.is_some_and(|r| r as usize <= k) {
                keep.insert(entity.clone());
            }
        }
    }
    keep
}
