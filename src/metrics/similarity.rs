//! Similarity judgment scoring for the lexical, semantic and syntactic
//! tasks.
//!
//! Each [`JudgmentPair`] names two items with a human similarity rating.
//! The model similarity score for a pair is the negated distance between
//! the two representations, computed either on pooled vectors or on the
//! full sequences through DTW alignment. The task metric is the Spearman
//! rank correlation between model scores and human ratings.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::FeatureCache;
use crate::metrics::dtw::DtwAligner;
use crate::metrics::{DistanceMetric, Pooling, frame_distance};
use crate::stats::{spearman, weighted_spearman};

/// How the model similarity of a pair is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityScoring {
    /// Negated distance between pooled sequence vectors.
    Pooled(Pooling),
    /// Negated DTW alignment cost between the full sequences.
    Aligned,
}

impl Default for SimilarityScoring {
    fn default() -> Self {
        Self::Pooled(Pooling::Mean)
    }
}

/// A pair of items with a human-annotated similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentPair {
    /// First item's clip id.
    pub item_a: String,
    /// Second item's clip id.
    pub item_b: String,
    /// Human similarity rating (fixed scale, e.g. 0-10).
    pub human_score: f64,
    /// Subpopulation weight for the weighted task variant.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Corpus frequency of the underlying word, for the band breakdown.
    #[serde(default)]
    pub frequency: Option<u64>,
}

/// Corpus-frequency band, as published with the benchmark's lexical gold
/// data: out-of-vocabulary, then 1-5, 6-20, 21-100 and >100 occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrequencyBand {
    /// Zero occurrences in the training corpus.
    #[serde(rename = "oov")]
    Oov,
    /// 1-5 occurrences.
    #[serde(rename = "1-5")]
    Low,
    /// 6-20 occurrences.
    #[serde(rename = "6-20")]
    Mid,
    /// 21-100 occurrences.
    #[serde(rename = "21-100")]
    High,
    /// More than 100 occurrences.
    #[serde(rename = ">100")]
    Top,
}

impl FrequencyBand {
    /// Band for a word with `count` corpus occurrences.
    ///
    /// Bands follow the benchmark's published half-open intervals
    /// `[0,1), [1,5), [5,20), [20,100), [100, inf)`.
    #[must_use]
    pub fn from_count(count: u64) -> Self {
        match count {
            0 => Self::Oov,
            1..=4 => Self::Low,
            5..=19 => Self::Mid,
            20..=99 => Self::High,
            _ => Self::Top,
        }
    }
}

impl std::fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oov => write!(f, "oov"),
            Self::Low => write!(f, "1-5"),
            Self::Mid => write!(f, "6-20"),
            Self::High => write!(f, "21-100"),
            Self::Top => write!(f, ">100"),
        }
    }
}

/// Correlation computed inside one frequency band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandScore {
    /// The frequency band.
    pub band: FrequencyBand,
    /// Number of pairs in the band.
    pub pairs: usize,
    /// Spearman correlation within the band.
    pub correlation: f64,
}

/// Result of scoring one judgment-pair set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityScore {
    /// Spearman correlation of model scores against human ratings.
    pub correlation: f64,
    /// Weighted variant, present when every scored pair carries a weight.
    pub weighted_correlation: Option<f64>,
    /// Per-frequency-band breakdown (empty without frequency metadata).
    pub by_frequency: Vec<BandScore>,
    /// Number of pairs scored.
    pub pairs: usize,
    /// Pairs excluded due to item-local errors.
    pub excluded: usize,
}

/// One scored pair, before aggregation.
struct PairObs {
    model: f64,
    human: f64,
    weight: Option<f64>,
    frequency: Option<u64>,
}

/// Score a judgment-pair set.
///
/// Pairs are scored in parallel. Item-local errors exclude the pair and are
/// counted in [`SimilarityScore::excluded`]; a missing clip fails the whole
/// set. Fails with [`Error::InsufficientData`] when fewer than two pairs
/// survive.
pub fn score_pairs(
    cache: &FeatureCache,
    pairs: &[JudgmentPair],
    metric: DistanceMetric,
    scoring: SimilarityScoring,
) -> Result<SimilarityScore> {
    let observations: Vec<Option<PairObs>> = pairs
        .par_iter()
        .map_init(
            || DtwAligner::new(metric),
            |aligner, pair| match pair_distance(cache, aligner, pair, metric, scoring) {
                Ok(distance) => Ok(Some(PairObs {
                    model: -distance,
                    human: pair.human_score,
                    weight: pair.weight,
                    frequency: pair.frequency,
                })),
                Err(err) if err.is_item_local() => {
                    tracing::warn!(
                        item_a = %pair.item_a,
                        item_b = %pair.item_b,
                        error = %err,
                        "judgment pair excluded"
                    );
                    Ok(None)
                }
                Err(err) => Err(err),
            },
        )
        .collect::<Result<_>>()?;

    let scored: Vec<PairObs> = observations.into_iter().flatten().collect();
    let excluded = pairs.len() - scored.len();
    if scored.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: scored.len(),
        });
    }

    let model: Vec<f64> = scored.iter().map(|o| o.model).collect();
    let human: Vec<f64> = scored.iter().map(|o| o.human).collect();
    let correlation = spearman(&model, &human)?;

    let weighted_correlation = if scored.iter().all(|o| o.weight.is_some()) {
        let weights: Vec<f64> = scored.iter().map(|o| o.weight.unwrap_or(0.0)).collect();
        Some(weighted_spearman(&model, &human, &weights)?)
    } else {
        None
    };

    Ok(SimilarityScore {
        correlation,
        weighted_correlation,
        by_frequency: band_breakdown(&scored),
        pairs: scored.len(),
        excluded,
    })
}

fn pair_distance(
    cache: &FeatureCache,
    aligner: &mut DtwAligner,
    pair: &JudgmentPair,
    metric: DistanceMetric,
    scoring: SimilarityScoring,
) -> Result<f64> {
    let a = cache.frames(&pair.item_a)?;
    let b = cache.frames(&pair.item_b)?;
    match scoring {
        SimilarityScoring::Pooled(pooling) => {
            let va = pooling.apply(&a)?;
            let vb = pooling.apply(&b)?;
            frame_distance(metric, &va, &vb)
        }
        SimilarityScoring::Aligned => aligner.align(&a, &b),
    }
}

/// Per-band correlations; bands with fewer than two pairs are skipped.
fn band_breakdown(scored: &[PairObs]) -> Vec<BandScore> {
    let mut bands: std::collections::BTreeMap<FrequencyBand, (Vec<f64>, Vec<f64>)> =
        std::collections::BTreeMap::new();
    for obs in scored {
        if let Some(count) = obs.frequency {
            let entry = bands.entry(FrequencyBand::from_count(count)).or_default();
            entry.0.push(obs.model);
            entry.1.push(obs.human);
        }
    }

    bands
        .into_iter()
        .filter_map(|(band, (model, human))| {
            let correlation = spearman(&model, &human).ok()?;
            Some(BandScore {
                band,
                pairs: model.len(),
                correlation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureSource, FrameSequence, InMemorySource};
    use std::sync::Arc;

    /// Clips c0..c4 at increasing offsets from an anchor clip, so model
    /// distance to the anchor grows strictly with the clip index.
    fn graded_source() -> InMemorySource {
        let mut source = InMemorySource::new();
        source.insert_frames(FrameSequence::new("anchor", 2, vec![1.0, 0.0]));
        for i in 0..5 {
            let offset = i as f64;
            source.insert_frames(FrameSequence::new(
                format!("c{i}"),
                2,
                vec![1.0, offset],
            ));
        }
        source
    }

    fn pair(b: &str, human: f64) -> JudgmentPair {
        JudgmentPair {
            item_a: "anchor".to_string(),
            item_b: b.to_string(),
            human_score: human,
            weight: None,
            frequency: None,
        }
    }

    fn cache_of(source: InMemorySource) -> FeatureCache {
        FeatureCache::new(Arc::new(source) as Arc<dyn FeatureSource>)
    }

    #[test]
    fn test_rank_matching_judgments_give_perfect_correlation() {
        let cache = cache_of(graded_source());
        // Human ratings fall as the model distance rises: rank match.
        let pairs = vec![
            pair("c0", 10.0),
            pair("c1", 7.0),
            pair("c2", 5.5),
            pair("c3", 2.0),
            pair("c4", 0.1),
        ];

        let score = score_pairs(
            &cache,
            &pairs,
            DistanceMetric::Euclidean,
            SimilarityScoring::Pooled(Pooling::Mean),
        )
        .unwrap();
        assert!((score.correlation - 1.0).abs() < 1e-12);
        assert_eq!(score.pairs, 5);
        assert_eq!(score.excluded, 0);
        assert!(score.weighted_correlation.is_none());
    }

    #[test]
    fn test_aligned_scoring_matches_ranks() {
        let cache = cache_of(graded_source());
        let pairs = vec![pair("c0", 3.0), pair("c2", 2.0), pair("c4", 1.0)];

        let score = score_pairs(
            &cache,
            &pairs,
            DistanceMetric::Euclidean,
            SimilarityScoring::Aligned,
        )
        .unwrap();
        assert!((score.correlation - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_pairs() {
        let cache = cache_of(graded_source());
        let pairs = vec![pair("c0", 1.0)];
        assert!(matches!(
            score_pairs(
                &cache,
                &pairs,
                DistanceMetric::Euclidean,
                SimilarityScoring::default(),
            )
            .unwrap_err(),
            Error::InsufficientData { needed: 2, got: 1 }
        ));
    }

    #[test]
    fn test_weighted_variant_present_when_all_weighted() {
        let cache = cache_of(graded_source());
        let mut pairs = vec![pair("c0", 9.0), pair("c2", 5.0), pair("c4", 1.0)];
        for (i, p) in pairs.iter_mut().enumerate() {
            p.weight = Some(1.0 + i as f64);
        }

        let score = score_pairs(
            &cache,
            &pairs,
            DistanceMetric::Euclidean,
            SimilarityScoring::default(),
        )
        .unwrap();
        let weighted = score.weighted_correlation.unwrap();
        assert!((weighted - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_norm_pair_excluded_under_angular() {
        let mut source = graded_source();
        source.insert_frames(FrameSequence::new("zero", 2, vec![0.0, 0.0]));
        let cache = cache_of(source);

        let pairs = vec![pair("c1", 3.0), pair("c2", 2.0), pair("zero", 1.0)];
        let score = score_pairs(
            &cache,
            &pairs,
            DistanceMetric::Angular,
            SimilarityScoring::default(),
        )
        .unwrap();
        assert_eq!(score.pairs, 2);
        assert_eq!(score.excluded, 1);
    }

    #[test]
    fn test_missing_clip_fails_task() {
        let cache = cache_of(graded_source());
        let pairs = vec![pair("c0", 2.0), pair("ghost", 1.0)];
        assert!(matches!(
            score_pairs(
                &cache,
                &pairs,
                DistanceMetric::Euclidean,
                SimilarityScoring::default(),
            )
            .unwrap_err(),
            Error::ClipNotFound(clip) if clip == "ghost"
        ));
    }

    #[test]
    fn test_frequency_band_assignment() {
        assert_eq!(FrequencyBand::from_count(0), FrequencyBand::Oov);
        assert_eq!(FrequencyBand::from_count(1), FrequencyBand::Low);
        assert_eq!(FrequencyBand::from_count(4), FrequencyBand::Low);
        assert_eq!(FrequencyBand::from_count(5), FrequencyBand::Mid);
        assert_eq!(FrequencyBand::from_count(20), FrequencyBand::High);
        assert_eq!(FrequencyBand::from_count(100), FrequencyBand::Top);
    }

    #[test]
    fn test_band_breakdown_skips_thin_bands() {
        let cache = cache_of(graded_source());
        let mut pairs = vec![
            pair("c0", 9.0),
            pair("c1", 7.0),
            pair("c2", 5.0),
            pair("c4", 1.0),
        ];
        pairs[0].frequency = Some(2);
        pairs[1].frequency = Some(3);
        pairs[2].frequency = Some(50);
        // pairs[3] has no frequency metadata and joins no band.

        let score = score_pairs(
            &cache,
            &pairs,
            DistanceMetric::Euclidean,
            SimilarityScoring::default(),
        )
        .unwrap();
        assert_eq!(score.by_frequency.len(), 1);
        assert_eq!(score.by_frequency[0].band, FrequencyBand::Low);
        assert_eq!(score.by_frequency[0].pairs, 2);
    }
}
