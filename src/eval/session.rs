//! Evaluation session: configuration, task driving and aggregation.
//!
//! [`EvalSession`] owns the per-run [`FeatureCache`] and walks the supplied
//! [`TaskDefinitions`], producing one [`EvaluationReport`]. Tasks are
//! independent: a task that fails is recorded with its reason and the run
//! carries on with the remaining tasks.

use std::sync::Arc;

use crate::error::Result;
use crate::eval::report::{EvaluationReport, TaskOutcome, TaskResult, TaskScore};
use crate::features::{FeatureCache, FeatureSource};
use crate::metrics::abx::{self, SpeakerMode, Triplet};
use crate::metrics::similarity::{self, JudgmentPair, SimilarityScoring};
use crate::metrics::{DistanceMetric, bitrate};

/// Which representation kind the phonetic task scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Continuous frame vectors, compared with the configured metric.
    #[default]
    Continuous,
    /// Discrete unit labels, compared with the 0/1 symbol distance.
    Discrete,
}

/// Configuration for an evaluation session.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Submission identifier recorded in the report.
    pub submission_id: String,

    /// Frame distance metric for continuous representations.
    pub metric: DistanceMetric,

    /// How similarity-task pair scores are computed.
    pub scoring: SimilarityScoring,

    /// Representation kind for the phonetic task.
    pub representation: Representation,
}

impl EvalConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }
}

/// Builder for [`EvalConfig`].
#[derive(Debug, Default)]
pub struct EvalConfigBuilder {
    submission_id: Option<String>,
    metric: Option<DistanceMetric>,
    scoring: Option<SimilarityScoring>,
    representation: Option<Representation>,
}

impl EvalConfigBuilder {
    /// Set the submission identifier.
    #[must_use]
    pub fn submission_id(mut self, id: impl Into<String>) -> Self {
        self.submission_id = Some(id.into());
        self
    }

    /// Set the frame distance metric.
    #[must_use]
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Set the similarity scoring strategy.
    #[must_use]
    pub fn scoring(mut self, scoring: SimilarityScoring) -> Self {
        self.scoring = Some(scoring);
        self
    }

    /// Set the representation kind for the phonetic task.
    #[must_use]
    pub fn representation(mut self, representation: Representation) -> Self {
        self.representation = Some(representation);
        self
    }

    /// Build the configuration.
    ///
    /// # Panics
    ///
    /// Panics if `submission_id` is not set.
    #[must_use]
    pub fn build(self) -> EvalConfig {
        EvalConfig {
            submission_id: self.submission_id.expect("submission_id is required"),
            metric: self.metric.unwrap_or_default(),
            scoring: self.scoring.unwrap_or_default(),
            representation: self.representation.unwrap_or_default(),
        }
    }
}

/// The phonetic task's two triplet sets.
#[derive(Debug, Clone, Default)]
pub struct PhoneticTask {
    /// Within-speaker triplets.
    pub within: Vec<Triplet>,
    /// Across-speaker triplets.
    pub across: Vec<Triplet>,
}

/// The evaluation items for one run, supplied by the benchmark dataset.
///
/// Tasks left as `None` are skipped and do not appear in the report.
#[derive(Debug, Clone, Default)]
pub struct TaskDefinitions {
    /// ABX triplet sets.
    pub phonetic: Option<PhoneticTask>,
    /// Lexical judgment pairs.
    pub lexical: Option<Vec<JudgmentPair>>,
    /// Semantic judgment pairs (may carry weights).
    pub semantic: Option<Vec<JudgmentPair>>,
    /// Syntactic judgment pairs.
    pub syntactic: Option<Vec<JudgmentPair>>,
    /// Clip ids of the discrete unit track to estimate bitrate over.
    pub bitrate: Option<Vec<String>>,
}

/// Evaluation session for one submission.
///
/// # Example
///
/// ```rust,ignore
/// use repr_eval::{DirectorySource, EvalConfig, EvalSession, TaskDefinitions};
///
/// let config = EvalConfig::builder().submission_id("baseline").build();
/// let source = DirectorySource::new("./submission/dev");
/// let session = EvalSession::new(config, std::sync::Arc::new(source));
///
/// let report = session.evaluate(&tasks);
/// println!("{}", serde_json::to_string_pretty(&report)?);
/// ```
pub struct EvalSession {
    config: EvalConfig,
    cache: FeatureCache,
}

impl EvalSession {
    /// Create a session reading features from `source`.
    #[must_use]
    pub fn new(config: EvalConfig, source: Arc<dyn FeatureSource>) -> Self {
        Self {
            config,
            cache: FeatureCache::new(source),
        }
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Run every defined task and aggregate the outcomes into a report.
    ///
    /// Never fails as a whole: each task's error is caught at the task
    /// boundary and recorded as [`TaskOutcome::Failed`].
    #[must_use]
    pub fn evaluate(&self, tasks: &TaskDefinitions) -> EvaluationReport {
        let mut report = EvaluationReport::new(self.config.submission_id.clone());

        if let Some(phonetic) = &tasks.phonetic {
            self.run_task(&mut report, "phonetic", || self.phonetic_task(phonetic));
        }
        if let Some(pairs) = &tasks.lexical {
            self.run_task(&mut report, "lexical", || self.judgment_task(pairs));
        }
        if let Some(pairs) = &tasks.semantic {
            self.run_task(&mut report, "semantic", || self.judgment_task(pairs));
        }
        if let Some(pairs) = &tasks.syntactic {
            self.run_task(&mut report, "syntactic", || self.judgment_task(pairs));
        }
        if let Some(clips) = &tasks.bitrate {
            self.run_task(&mut report, "bitrate", || self.bitrate_task(clips));
        }

        report
    }

    fn run_task<F>(&self, report: &mut EvaluationReport, name: &str, task: F)
    where
        F: FnOnce() -> Result<TaskResult>,
    {
        tracing::info!(task = name, "scoring task");
        match task() {
            Ok(result) => {
                if result.items_excluded > 0 {
                    tracing::warn!(
                        task = name,
                        excluded = result.items_excluded,
                        "items excluded from aggregation"
                    );
                }
                report.record(name, TaskOutcome::Completed { result });
            }
            Err(err) => {
                tracing::warn!(task = name, error = %err, "task failed");
                report.record(
                    name,
                    TaskOutcome::Failed {
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    fn phonetic_task(&self, task: &PhoneticTask) -> Result<TaskResult> {
        let score_set = |triplets: &[Triplet], mode| match self.config.representation {
            Representation::Continuous => {
                abx::score_triplets(&self.cache, triplets, self.config.metric, mode)
            }
            Representation::Discrete => abx::score_unit_triplets(&self.cache, triplets, mode),
        };

        let within = score_set(&task.within, SpeakerMode::Within)?;
        let across = score_set(&task.across, SpeakerMode::Across)?;

        Ok(TaskResult {
            score: TaskScore::Phonetic {
                within: within.error_rate,
                across: across.error_rate,
                average: (within.error_rate + across.error_rate) / 2.0,
            },
            items_scored: within.scored + across.scored,
            items_excluded: within.excluded + across.excluded,
        })
    }

    fn judgment_task(&self, pairs: &[JudgmentPair]) -> Result<TaskResult> {
        let score =
            similarity::score_pairs(&self.cache, pairs, self.config.metric, self.config.scoring)?;

        Ok(TaskResult {
            score: TaskScore::Correlation {
                coefficient: score.correlation,
                weighted: score.weighted_correlation,
                by_frequency: score.by_frequency,
            },
            items_scored: score.pairs,
            items_excluded: score.excluded,
        })
    }

    fn bitrate_task(&self, clips: &[String]) -> Result<TaskResult> {
        let sequences = clips
            .iter()
            .map(|clip| self.cache.units(clip))
            .collect::<Result<Vec<_>>>()?;
        let score = bitrate::estimate_bitrate(sequences.iter().map(Arc::as_ref))?;

        Ok(TaskResult {
            score: TaskScore::Bitrate {
                bits_per_second: score.bits_per_second,
                entropy_bits: score.entropy_bits,
                alphabet_size: score.alphabet_size,
            },
            items_scored: clips.len(),
            items_excluded: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FrameSequence, InMemorySource, UnitSequence};
    use crate::metrics::abx::TripletTarget;

    /// Toy dev set exercising every task:
    ///
    /// - phonetic: one fully separable triplet (X copies A) and one
    ///   indistinguishable triplet (A, B and X identical), in different
    ///   groups, in both speaker modes
    /// - similarity: three pairs whose human ratings exactly match the
    ///   model's distance ranks
    /// - bitrate: two clips over a uniform two-symbol alphabet
    fn toy_source() -> InMemorySource {
        let mut source = InMemorySource::new();

        let flat = |v: f64, n: usize| -> Vec<f64> { vec![v; n] };
        source.insert_frames(FrameSequence::new("ref-a", 2, flat(1.0, 8)));
        source.insert_frames(FrameSequence::new("ref-b", 2, flat(50.0, 8)));
        source.insert_frames(FrameSequence::new("probe", 2, flat(1.0, 8)));
        source.insert_frames(FrameSequence::new("same-a", 2, flat(3.0, 6)));
        source.insert_frames(FrameSequence::new("same-b", 2, flat(3.0, 6)));
        source.insert_frames(FrameSequence::new("same-x", 2, flat(3.0, 6)));

        source.insert_frames(FrameSequence::new("w0", 2, vec![1.0, 0.0]));
        source.insert_frames(FrameSequence::new("w1", 2, vec![1.0, 1.0]));
        source.insert_frames(FrameSequence::new("w2", 2, vec![1.0, 2.0]));
        source.insert_frames(FrameSequence::new("w3", 2, vec![1.0, 3.0]));

        source.insert_units(UnitSequence::new(
            "u1",
            vec!["a".into(), "b".into()],
            0.02,
        ));
        source.insert_units(UnitSequence::new(
            "u2",
            vec!["a".into(), "b".into()],
            0.02,
        ));
        source
    }

    fn toy_tasks() -> TaskDefinitions {
        let triplet = |a: &str, b: &str, x: &str, group: &str| Triplet {
            a: a.to_string(),
            b: b.to_string(),
            x: x.to_string(),
            target: TripletTarget::A,
            group: group.to_string(),
        };
        let triplets = vec![
            triplet("ref-a", "ref-b", "probe", "separable"),
            triplet("same-a", "same-b", "same-x", "identical"),
        ];
        let pair = |a: &str, b: &str, human: f64| JudgmentPair {
            item_a: a.to_string(),
            item_b: b.to_string(),
            human_score: human,
            weight: None,
            frequency: None,
        };

        TaskDefinitions {
            phonetic: Some(PhoneticTask {
                within: triplets.clone(),
                across: triplets,
            }),
            lexical: None,
            semantic: Some(vec![
                pair("w0", "w1", 8.0),
                pair("w0", "w2", 5.0),
                pair("w0", "w3", 2.0),
            ]),
            syntactic: None,
            bitrate: Some(vec!["u1".to_string(), "u2".to_string()]),
        }
    }

    fn toy_session() -> EvalSession {
        let config = EvalConfig::builder()
            .submission_id("toy")
            .metric(DistanceMetric::Euclidean)
            .build();
        EvalSession::new(config, Arc::new(toy_source()))
    }

    #[test]
    fn test_toy_dev_set_end_to_end() {
        let report = toy_session().evaluate(&toy_tasks());
        assert!(report.is_complete());
        assert_eq!(report.tasks.len(), 3);

        // Separable group scores 0, the identical group ties into an error:
        // per-group mean is 0.5 in both speaker modes.
        match report.result("phonetic").unwrap().score {
            TaskScore::Phonetic {
                within,
                across,
                average,
            } => {
                assert!((within - 0.5).abs() < 1e-6);
                assert!((across - 0.5).abs() < 1e-6);
                assert!((average - 0.5).abs() < 1e-6);
            }
            _ => panic!("wrong score kind"),
        }

        // Human ratings are a monotone transform of the negated distances.
        match &report.result("semantic").unwrap().score {
            TaskScore::Correlation { coefficient, .. } => {
                assert!((coefficient - 1.0).abs() < 1e-6);
            }
            _ => panic!("wrong score kind"),
        }

        // Uniform binary alphabet at 100 frames/s: 100 bits/s.
        match report.result("bitrate").unwrap().score {
            TaskScore::Bitrate {
                bits_per_second,
                entropy_bits,
                alphabet_size,
            } => {
                assert!((bits_per_second - 100.0).abs() < 1e-6);
                assert!((entropy_bits - 1.0).abs() < 1e-6);
                assert_eq!(alphabet_size, 2);
            }
            _ => panic!("wrong score kind"),
        }
    }

    #[test]
    fn test_failed_task_recorded_not_raised() {
        let mut tasks = toy_tasks();
        tasks.semantic = Some(vec![JudgmentPair {
            item_a: "ghost".to_string(),
            item_b: "w0".to_string(),
            human_score: 1.0,
            weight: None,
            frequency: None,
        }]);

        let report = toy_session().evaluate(&tasks);
        assert!(!report.is_complete());
        match report.outcome("semantic").unwrap() {
            TaskOutcome::Failed { reason } => assert!(reason.contains("ghost")),
            TaskOutcome::Completed { .. } => panic!("task should have failed"),
        }
        // The other tasks still complete.
        assert!(report.result("phonetic").is_some());
        assert!(report.result("bitrate").is_some());
    }

    #[test]
    fn test_skipped_tasks_absent_from_report() {
        let tasks = TaskDefinitions {
            bitrate: Some(vec!["u1".to_string()]),
            ..TaskDefinitions::default()
        };
        let report = toy_session().evaluate(&tasks);
        assert_eq!(report.tasks.len(), 1);
        assert!(report.outcome("phonetic").is_none());
    }

    #[test]
    fn test_discrete_phonetic_representation() {
        let mut source = toy_source();
        for clip in ["ref-a", "probe"] {
            source.insert_units(UnitSequence::new(
                clip,
                vec!["p".into(), "t".into()],
                0.02,
            ));
        }
        source.insert_units(UnitSequence::new(
            "ref-b",
            vec!["k".into(), "g".into()],
            0.02,
        ));

        let config = EvalConfig::builder()
            .submission_id("toy-units")
            .representation(Representation::Discrete)
            .build();
        let session = EvalSession::new(config, Arc::new(source));

        let triplet = Triplet {
            a: "ref-a".to_string(),
            b: "ref-b".to_string(),
            x: "probe".to_string(),
            target: TripletTarget::A,
            group: "g1".to_string(),
        };
        let tasks = TaskDefinitions {
            phonetic: Some(PhoneticTask {
                within: vec![triplet.clone()],
                across: vec![triplet],
            }),
            ..TaskDefinitions::default()
        };

        let report = session.evaluate(&tasks);
        match report.result("phonetic").unwrap().score {
            TaskScore::Phonetic { average, .. } => assert!((average - 0.0).abs() < 1e-12),
            _ => panic!("wrong score kind"),
        }
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = EvalConfig::builder().submission_id("s").build();
        assert_eq!(config.metric, DistanceMetric::Angular);
        assert_eq!(config.representation, Representation::Continuous);
        assert_eq!(
            config.scoring,
            SimilarityScoring::Pooled(crate::metrics::Pooling::Mean)
        );
    }
}
