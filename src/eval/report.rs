//! Report types for evaluation results.
//!
//! The [`EvaluationReport`] is the engine's only output: a mapping from task
//! name to [`TaskOutcome`] plus submission metadata. It is consumed by the
//! leaderboard-entry generator and the CLI's result printer, both outside
//! this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::similarity::BandScore;

/// Scalar metric(s) produced by one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskScore {
    /// ABX error rates from the phonetic task.
    Phonetic {
        /// Within-speaker error rate.
        within: f64,
        /// Across-speaker error rate.
        across: f64,
        /// Mean of the two, the combined phonetic score.
        average: f64,
    },
    /// Rank correlation from a similarity judgment task.
    Correlation {
        /// Spearman correlation against human judgments.
        coefficient: f64,
        /// Weighted variant, when the dataset defines pair weights.
        #[serde(skip_serializing_if = "Option::is_none")]
        weighted: Option<f64>,
        /// Per-frequency-band breakdown, when the dataset carries
        /// frequency metadata.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        by_frequency: Vec<BandScore>,
    },
    /// Information-rate estimate for the discrete unit track.
    Bitrate {
        /// Bits per second.
        bits_per_second: f64,
        /// Entropy of the symbol distribution in bits per frame.
        entropy_bits: f64,
        /// Number of distinct symbols observed.
        alphabet_size: usize,
    },
}

/// A completed task's metrics plus traceability counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// The task's metric values.
    pub score: TaskScore,
    /// Items (triplets, pairs, clips) contributing to the score.
    pub items_scored: usize,
    /// Items excluded due to item-local errors.
    pub items_excluded: usize,
}

/// Outcome of one task: its result, or the reason it failed.
///
/// A failed task never disappears from the report; partial reports stay
/// producible for development-set runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The task completed and produced a result.
    Completed {
        /// The task's result.
        result: TaskResult,
    },
    /// The task aborted; the error is recorded verbatim.
    Failed {
        /// Why the task could not be scored.
        reason: String,
    },
}

impl TaskOutcome {
    /// The task result, if the task completed.
    #[must_use]
    pub fn result(&self) -> Option<&TaskResult> {
        match self {
            Self::Completed { result } => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

/// Final report for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Submission identifier.
    pub submission_id: String,
    /// Dataset split the run was scored on (always the dev split here).
    pub split: String,
    /// When this report was generated.
    #[serde(with = "rfc3339")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Outcome per task, ordered by task name.
    pub tasks: BTreeMap<String, TaskOutcome>,
}

impl EvaluationReport {
    /// Create an empty report for `submission_id` on the dev split.
    #[must_use]
    pub fn new(submission_id: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
            split: "dev".to_string(),
            timestamp: chrono::Utc::now(),
            tasks: BTreeMap::new(),
        }
    }

    /// Record a task outcome under `name`.
    pub fn record(&mut self, name: impl Into<String>, outcome: TaskOutcome) {
        self.tasks.insert(name.into(), outcome);
    }

    /// The outcome recorded for `name`, if any.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&TaskOutcome> {
        self.tasks.get(name)
    }

    /// The completed result for `name`, if the task ran and succeeded.
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&TaskResult> {
        self.tasks.get(name).and_then(TaskOutcome::result)
    }

    /// Whether every recorded task completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tasks
            .values()
            .all(|outcome| outcome.result().is_some())
    }
}

// RFC 3339 timestamps, matching the benchmark's leaderboard format.
mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phonetic_result() -> TaskResult {
        TaskResult {
            score: TaskScore::Phonetic {
                within: 0.1,
                across: 0.2,
                average: 0.15,
            },
            items_scored: 100,
            items_excluded: 2,
        }
    }

    #[test]
    fn test_record_and_lookup() {
        let mut report = EvaluationReport::new("baseline");
        report.record(
            "phonetic",
            TaskOutcome::Completed {
                result: phonetic_result(),
            },
        );
        report.record(
            "semantic",
            TaskOutcome::Failed {
                reason: "clip not found in submission: 'w1'".to_string(),
            },
        );

        assert!(report.result("phonetic").is_some());
        assert!(report.result("semantic").is_none());
        assert!(report.outcome("semantic").is_some());
        assert!(!report.is_complete());
        assert_eq!(report.split, "dev");
    }

    #[test]
    fn test_report_json_round_trip() {
        let mut report = EvaluationReport::new("baseline");
        report.record(
            "phonetic",
            TaskOutcome::Completed {
                result: phonetic_result(),
            },
        );

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: EvaluationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.submission_id, "baseline");
        let result = parsed.result("phonetic").unwrap();
        assert_eq!(result.items_scored, 100);
        match result.score {
            TaskScore::Phonetic { average, .. } => assert!((average - 0.15).abs() < 1e-12),
            _ => panic!("wrong score kind"),
        }
    }
}
