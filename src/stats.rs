//! Rank statistics used by the similarity tasks.
//!
//! ## Core functions
//!
//! - [`mean`], [`weighted_mean`]: basic averaging
//! - [`midranks`]: rank assignment with the mid-rank convention for ties
//! - [`pearson`], [`weighted_pearson`]: product-moment correlation
//! - [`spearman`], [`weighted_spearman`]: rank correlation
//!
//! The weighted variants multiply each observation's contribution by a
//! supplied weight; they are used by the semantic task when the dataset
//! defines subpopulation weights.

use crate::error::{Error, Result};

/// Compute arithmetic mean.
///
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute a weighted mean.
///
/// Returns `0.0` when the weights sum to zero.
#[must_use]
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    values
        .iter()
        .zip(weights.iter())
        .map(|(v, w)| v * w)
        .sum::<f64>()
        / total
}

/// Assign ranks (1-based) to `values`, averaging the ranks of tied entries.
///
/// This is the standard mid-rank convention used by Spearman's coefficient:
/// `[10.0, 20.0, 20.0, 30.0]` ranks as `[1.0, 2.5, 2.5, 4.0]`.
#[must_use]
pub fn midranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| {
        values[i]
            .partial_cmp(&values[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Tied block [start, end): every member gets the average rank.
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson product-moment correlation between `x` and `y`.
///
/// Fails with [`Error::InsufficientData`] when fewer than 2 points are
/// supplied. Returns `0.0` when either variable has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    check_paired(x, y)?;

    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Ok(0.0);
    }
    Ok(sxy / (sxx * syy).sqrt())
}

/// Spearman rank correlation between `x` and `y`.
///
/// Ties receive mid-ranks. Fails with [`Error::InsufficientData`] when fewer
/// than 2 points are supplied.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    check_paired(x, y)?;
    pearson(&midranks(x), &midranks(y))
}

/// Weighted Pearson correlation, with per-observation weights.
///
/// Fails with [`Error::InsufficientData`] when fewer than 2 points are
/// supplied or the weights sum to zero.
pub fn weighted_pearson(x: &[f64], y: &[f64], weights: &[f64]) -> Result<f64> {
    check_paired(x, y)?;
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return Err(Error::InsufficientData { needed: 2, got: 0 });
    }

    let mx = weighted_mean(x, weights);
    let my = weighted_mean(y, weights);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for ((a, b), w) in x.iter().zip(y.iter()).zip(weights.iter()) {
        let dx = a - mx;
        let dy = b - my;
        sxy += w * dx * dy;
        sxx += w * dx * dx;
        syy += w * dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Ok(0.0);
    }
    Ok(sxy / (sxx * syy).sqrt())
}

/// Weighted Spearman rank correlation.
///
/// Ranks are assigned unweighted with the mid-rank convention; the weights
/// then scale each pair's contribution to the correlation.
pub fn weighted_spearman(x: &[f64], y: &[f64], weights: &[f64]) -> Result<f64> {
    check_paired(x, y)?;
    weighted_pearson(&midranks(x), &midranks(y), weights)
}

fn check_paired(x: &[f64], y: &[f64]) -> Result<()> {
    assert_eq!(x.len(), y.len(), "paired samples must have equal length");
    if x.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: x.len(),
        });
    }
    Ok(())
}
