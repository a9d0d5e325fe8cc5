//! Scoring metrics for submitted representations.
//!
//! The headline metrics computed over a submission:
//!
//! - **ABX discriminability** ([`abx`]): phonetic error rate from A-vs-B-vs-X
//!   triplet tests over DTW-aligned sequences
//! - **Similarity correlation** ([`similarity`]): Spearman correlation of
//!   model similarity scores against human judgments
//! - **Bitrate** ([`bitrate`]): information rate of discrete unit sequences
//!
//! This module owns the shared distance kernel: a per-frame dissimilarity
//! that is symmetric, nonnegative and zero on identical input, selected by
//! [`DistanceMetric`].

pub mod abx;
pub mod bitrate;
pub mod dtw;
pub mod similarity;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::FrameSequence;

/// Frame-level distance used for continuous representations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Angular distance `1 - cosine_similarity`.
    #[default]
    Angular,
    /// Euclidean (L2) distance.
    Euclidean,
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Angular => write!(f, "angular"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Distance between two frames of equal dimensionality.
///
/// Fails with [`Error::DegenerateVector`] if either frame has zero norm
/// under the angular metric, and with [`Error::DimensionMismatch`] if the
/// frames disagree on dimensionality.
pub fn frame_distance(metric: DistanceMetric, a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    match metric {
        DistanceMetric::Angular => {
            let mut dot = 0.0;
            let mut norm_a = 0.0;
            let mut norm_b = 0.0;
            for (x, y) in a.iter().zip(b.iter()) {
                dot += x * y;
                norm_a += x * x;
                norm_b += y * y;
            }
            if norm_a == 0.0 || norm_b == 0.0 {
                return Err(Error::DegenerateVector);
            }
            // Identical frames must come out at exactly zero; the sqrt
            // round-trip below cannot guarantee that on its own.
            if a == b {
                return Ok(0.0);
            }
            let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
            Ok(1.0 - cosine)
        }
        DistanceMetric::Euclidean => {
            let sum: f64 = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum();
            Ok(sum.sqrt())
        }
    }
}

/// 0/1 mismatch distance between two discrete unit labels.
#[must_use]
pub fn symbol_distance(a: &str, b: &str) -> f64 {
    if a == b { 0.0 } else { 1.0 }
}

/// Frame pooling applied to collapse a sequence into a single vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pooling {
    /// Per-dimension mean over frames.
    #[default]
    Mean,
    /// Per-dimension maximum over frames.
    Max,
    /// Per-dimension minimum over frames.
    Min,
}

impl Pooling {
    /// Collapse `seq` into a single `dim`-sized vector.
    ///
    /// Fails with [`Error::EmptySequence`] if the sequence has no frames.
    pub fn apply(self, seq: &FrameSequence) -> Result<Vec<f64>> {
        if seq.is_empty() {
            return Err(Error::EmptySequence {
                clip: seq.clip_id().to_string(),
            });
        }

        match self {
            Self::Mean => {
                let mut pooled = vec![0.0; seq.dim()];
                for frame in seq.frames() {
                    for (acc, v) in pooled.iter_mut().zip(frame.iter()) {
                        *acc += v;
                    }
                }
                let n = seq.len() as f64;
                for acc in &mut pooled {
                    *acc /= n;
                }
                Ok(pooled)
            }
            Self::Max => Ok(fold_frames(seq, f64::max)),
            Self::Min => Ok(fold_frames(seq, f64::min)),
        }
    }
}

fn fold_frames(seq: &FrameSequence, combine: fn(f64, f64) -> f64) -> Vec<f64> {
    let mut pooled = seq.frame(0).to_vec();
    for frame in seq.frames().skip(1) {
        for (acc, v) in pooled.iter_mut().zip(frame.iter()) {
            *acc = combine(*acc, *v);
        }
    }
    pooled
}
