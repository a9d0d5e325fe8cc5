//! Error types for repr-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repr-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scoring a submission.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A zero-norm vector reached the angular distance kernel.
    #[error("degenerate zero-norm vector in angular distance")]
    DegenerateVector,

    /// Alignment was requested on an empty frame sequence.
    #[error("cannot align empty sequence (clip '{clip}')")]
    EmptySequence {
        /// Clip whose sequence was empty.
        clip: String,
    },

    /// A clip referenced by the task definition is absent from the submission.
    #[error("clip not found in submission: '{0}'")]
    ClipNotFound(String),

    /// A correlation was requested with too few data points.
    #[error("insufficient data: need at least {needed} points, got {got}")]
    InsufficientData {
        /// Minimum number of points required.
        needed: usize,
        /// Number of points actually available.
        got: usize,
    },

    /// Bitrate was requested for unit sequences of zero total duration.
    #[error("bitrate is undefined for zero total duration")]
    ZeroDuration,

    /// Frame dimensionality differs inside a comparison group.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the first operand.
        expected: usize,
        /// Dimensionality of the offending operand.
        actual: usize,
    },

    /// Failed to read or parse a feature file.
    #[error("feature load failed: {path}: {reason}")]
    FeatureLoad {
        /// Path of the feature file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid task-definition data.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether this error is local to a single triplet or pair.
    ///
    /// Item-local errors are recorded and excluded from aggregation without
    /// aborting the enclosing task. Everything else (a missing clip, a
    /// dimensionality mismatch across a comparison group, an I/O failure)
    /// indicates a structurally broken submission and fails the whole task.
    #[must_use]
    pub fn is_item_local(&self) -> bool {
        matches!(self, Self::DegenerateVector | Self::EmptySequence { .. })
    }
}
