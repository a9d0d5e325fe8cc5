//! # repr-eval
//!
//! Evaluation engine for machine-learned speech representations.
//!
//! Submissions provide precomputed features per audio clip (continuous
//! frame vectors and/or discrete unit labels); this library turns them into
//! the benchmark's headline metrics:
//!
//! - **phonetic discriminability** via ABX triplet tests over DTW-aligned
//!   sequences
//! - **lexical / semantic / syntactic similarity** via Spearman correlation
//!   against human judgments
//! - **bitrate** of discrete unit sequences from their empirical symbol
//!   distribution
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use repr_eval::{DirectorySource, EvalConfig, EvalSession, TaskDefinitions, dataset};
//!
//! let config = EvalConfig::builder().submission_id("baseline").build();
//! let source = DirectorySource::new("./submission/dev");
//! let session = EvalSession::new(config, Arc::new(source));
//!
//! let tasks = TaskDefinitions {
//!     semantic: Some(dataset::load_judgment_pairs("dev/semantic_pairs.csv")?),
//!     ..TaskDefinitions::default()
//! };
//! let report = session.evaluate(&tasks);
//! ```
//!
//! ## Modules
//!
//! - [`error`]: error types for the library
//! - [`features`]: submitted representations and their loading
//! - [`metrics`]: distance kernel, DTW, ABX, similarity and bitrate scoring
//! - [`stats`]: rank statistics (Spearman and friends)
//! - [`dataset`]: task-definition CSV loading
//! - [`eval`]: evaluation session and report aggregation

pub mod dataset;
pub mod error;
pub mod eval;
pub mod features;
pub mod metrics;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use eval::{
    report::{EvaluationReport, TaskOutcome, TaskResult, TaskScore},
    session::{EvalConfig, EvalSession, PhoneticTask, Representation, TaskDefinitions},
};
pub use features::{
    DirectorySource, FeatureCache, FeatureSource, FrameSequence, InMemorySource, UnitSequence,
};
pub use metrics::abx::{AbxScore, SpeakerMode, Triplet, TripletTarget};
pub use metrics::bitrate::BitrateScore;
pub use metrics::similarity::{JudgmentPair, SimilarityScore, SimilarityScoring};
pub use metrics::{DistanceMetric, Pooling, dtw::DtwAligner};
