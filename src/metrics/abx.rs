//! ABX discrimination scoring over minimal-pair triplets.
//!
//! Each [`Triplet`] holds three clip ids: two references A and B from
//! different conditions, and a probe X whose phonetic identity matches
//! exactly one of them. X is predicted to match A iff the DTW alignment
//! cost `d(X, A)` is strictly below `d(X, B)`; a tie counts as an error.
//!
//! Error rates are first aggregated inside each grouping key supplied by
//! the triplet metadata (phonetic context, speaker condition), then the
//! task-level score is the unweighted mean over non-empty groups. This
//! keeps over-represented contexts from dominating the score.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::FeatureCache;
use crate::metrics::DistanceMetric;
use crate::metrics::dtw::DtwAligner;
use crate::stats::mean;

/// Which reference clip the probe X matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripletTarget {
    /// X has the phonetic identity of A.
    A,
    /// X has the phonetic identity of B.
    B,
}

/// Whether A, B and X were produced by the same speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerMode {
    /// All three clips come from one speaker.
    Within,
    /// X comes from a different speaker than A and B.
    Across,
}

impl std::fmt::Display for SpeakerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Within => write!(f, "within"),
            Self::Across => write!(f, "across"),
        }
    }
}

/// One A/B/X discrimination item from the task definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triplet {
    /// Reference clip A.
    pub a: String,
    /// Reference clip B.
    pub b: String,
    /// Probe clip X.
    pub x: String,
    /// Which reference X matches.
    pub target: TripletTarget,
    /// Grouping key (phonetic context / speaker condition) for aggregation.
    pub group: String,
}

/// Error rate of a single triplet group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupScore {
    /// Grouping key.
    pub group: String,
    /// `1 - mean(correct)` over the group's scored triplets.
    pub error_rate: f64,
    /// Number of triplets scored in this group.
    pub triplets: usize,
}

/// Result of scoring one triplet set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbxScore {
    /// Speaker mode of the triplet set.
    pub mode: SpeakerMode,
    /// Unweighted mean of per-group error rates.
    pub error_rate: f64,
    /// Per-group breakdown, ordered by group key.
    pub groups: Vec<GroupScore>,
    /// Total triplets scored.
    pub scored: usize,
    /// Triplets excluded due to item-local errors.
    pub excluded: usize,
}

/// Score a triplet set over continuous representations.
///
/// Triplets are scored in parallel; the reduction is a per-group sum and
/// count, so worker scheduling never changes the result. Item-local errors
/// exclude the triplet and are counted in [`AbxScore::excluded`]; a missing
/// clip or a cross-clip dimension mismatch fails the whole set.
pub fn score_triplets(
    cache: &FeatureCache,
    triplets: &[Triplet],
    metric: DistanceMetric,
    mode: SpeakerMode,
) -> Result<AbxScore> {
    let outcomes: Vec<Option<(&str, bool)>> = triplets
        .par_iter()
        .map_init(
            || DtwAligner::new(metric),
            |aligner, t| {
                let x = cache.frames(&t.x)?;
                let a = cache.frames(&t.a)?;
                let b = cache.frames(&t.b)?;
                let dax = aligner.align(&x, &a);
                let dbx = aligner.align(&x, &b);
                judge(t, dax, dbx)
            },
        )
        .collect::<Result<_>>()?;

    aggregate(mode, triplets.len(), outcomes)
}

/// Score a triplet set over discrete unit representations.
///
/// Same protocol as [`score_triplets`] with the 0/1 symbol distance.
pub fn score_unit_triplets(
    cache: &FeatureCache,
    triplets: &[Triplet],
    mode: SpeakerMode,
) -> Result<AbxScore> {
    let outcomes: Vec<Option<(&str, bool)>> = triplets
        .par_iter()
        .map_init(
            || DtwAligner::new(DistanceMetric::default()),
            |aligner, t| {
                let x = cache.units(&t.x)?;
                let a = cache.units(&t.a)?;
                let b = cache.units(&t.b)?;
                let dax = aligner.align_units(&x, &a);
                let dbx = aligner.align_units(&x, &b);
                judge(t, dax, dbx)
            },
        )
        .collect::<Result<_>>()?;

    aggregate(mode, triplets.len(), outcomes)
}

/// Turn the two alignment costs into a correctness indicator.
///
/// `Ok(None)` marks a triplet excluded by an item-local error.
fn judge(
    triplet: &Triplet,
    dax: Result<f64>,
    dbx: Result<f64>,
) -> Result<Option<(&str, bool)>> {
    let (dax, dbx) = match (dax, dbx) {
        (Ok(dax), Ok(dbx)) => (dax, dbx),
        (Err(err), _) | (_, Err(err)) => {
            if err.is_item_local() {
                tracing::warn!(
                    x = %triplet.x,
                    a = %triplet.a,
                    b = %triplet.b,
                    error = %err,
                    "triplet excluded"
                );
                return Ok(None);
            }
            return Err(err);
        }
    };

    // Strict inequality: a tie never counts as a correct discrimination.
    let predicted = if dax < dbx {
        TripletTarget::A
    } else {
        TripletTarget::B
    };
    let correct = dax != dbx && predicted == triplet.target;
    Ok(Some((triplet.group.as_str(), correct)))
}

fn aggregate(
    mode: SpeakerMode,
    total: usize,
    outcomes: Vec<Option<(&str, bool)>>,
) -> Result<AbxScore> {
    // BTreeMap keeps the group breakdown deterministically ordered.
    let mut by_group: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    let mut scored = 0;
    for (group, correct) in outcomes.into_iter().flatten() {
        let entry = by_group.entry(group).or_insert((0, 0));
        entry.0 += usize::from(correct);
        entry.1 += 1;
        scored += 1;
    }

    if by_group.is_empty() {
        return Err(Error::InsufficientData { needed: 1, got: 0 });
    }

    let groups: Vec<GroupScore> = by_group
        .into_iter()
        .map(|(group, (correct, count))| GroupScore {
            group: group.to_string(),
            error_rate: 1.0 - correct as f64 / count as f64,
            triplets: count,
        })
        .collect();

    let rates: Vec<f64> = groups.iter().map(|g| g.error_rate).collect();
    Ok(AbxScore {
        mode,
        error_rate: mean(&rates),
        groups,
        scored,
        excluded: total - scored,
    })
}
