//! Justified-row tiling: partitions a run of aspect ratios into rows whose
//! combined ratio approximates a target threshold.

use crate::error::{Error, Result};

/// Partitions `ratios` into contiguous rows, returning breakpoint indices.
///
/// Each breakpoint is the exclusive end of one row; breakpoints are strictly
/// increasing. With `use_remainder` the final breakpoint always equals
/// `ratios.len()`, even if the trailing row falls short of `threshold`.
/// Without it, a trailing stretch that never reaches the threshold is left
/// untiled so the caller can carry it as an edge remainder until more items
/// arrive.
///
/// `threshold` is the target row aspect ratio and must be at least 1; an
/// empty `ratios` is an error.
pub fn tile(ratios: &[f64], threshold: f64, use_remainder: bool) -> Result<Vec<usize>> {
    if threshold < 1.0 {
        return Err(Error::Threshold(threshold));
    }
    if ratios.is_empty() {
        return Err(Error::NoItems);
    }

    if let Some(breaks) = tile_uniform(ratios, threshold, use_remainder) {
        return Ok(breaks);
    }
    Ok(tile_search(ratios, threshold, use_remainder))
}

/// Arithmetic shortcut for the degenerate all-equal case: the same per-row
/// count repeats until the threshold is met, so no search is needed.
fn tile_uniform(ratios: &[f64], threshold: f64, use_remainder: bool) -> Option<Vec<usize>> {
    let first = ratios[0];
    if ratios.iter().any(|r| (r - first).abs() > 1e-9) {
        return None;
    }

    // Smallest count whose cumulative ratio reaches the threshold.
    let per_row = ((threshold / first).ceil().max(1.0)) as usize;
    let full_rows = ratios.len() / per_row;
    let mut breaks: Vec<usize> = (1..=full_rows).map(|i| i * per_row).collect();
    if use_remainder && full_rows * per_row < ratios.len() {
        breaks.push(ratios.len());
    }
    Some(breaks)
}

/// General case: best-cumulative-score search over the row DAG.
///
/// From every committed breakpoint, candidate row endings are all indices
/// whose cumulative ratio stays at or below the threshold, plus the first one
/// that exceeds it. A row is scored `(1 + |threshold - sum|)^3`; the cubic
/// strongly disfavors rows far from the target. Nodes keep only their best
/// incoming chain, so each suffix is explored once.
fn tile_search(ratios: &[f64], threshold: f64, use_remainder: bool) -> Vec<usize> {
    let n = ratios.len();

    let mut prefix = Vec::with_capacity(n + 1);
    let mut running = 0.0;
    prefix.push(0.0);
    for &r in ratios {
        running += r;
        prefix.push(running);
    }

    let row_score = |from: usize, to: usize| -> f64 {
        let delta = threshold - (prefix[to] - prefix[from]);
        (1.0 + delta.abs()).powi(3)
    };

    let mut best = vec![f64::INFINITY; n + 1];
    let mut back = vec![0usize; n + 1];
    best[0] = 0.0;
    for from in 0..n {
        if !best[from].is_finite() {
            continue;
        }
        for to in from + 1..=n {
            let score = best[from] + row_score(from, to);
            if score < best[to] {
                best[to] = score;
                back[to] = from;
            }
            if prefix[to] - prefix[from] > threshold {
                break;
            }
        }
    }

    let mut breaks = Vec::new();
    let mut at = n;
    while at > 0 {
        breaks.push(at);
        at = back[at];
    }
    breaks.reverse();

    if !use_remainder {
        // Cut trailing rows that never filled up; they stay in the edge.
        while let Some(&last) = breaks.last() {
            let from = if breaks.len() >= 2 {
                breaks[breaks.len() - 2]
            } else {
                0
            };
            if prefix[last] - prefix[from] >= threshold {
                break;
            }
            breaks.pop();
        }
    }

    breaks
}
