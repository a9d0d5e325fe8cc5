//! Submitted feature representations and their loading.
//!
//! A submission provides one representation per audio clip: a
//! [`FrameSequence`] of fixed-dimension real vectors (continuous
//! representations) and/or a [`UnitSequence`] of discrete symbol labels
//! (quantized representations). Both are immutable once loaded and are shared
//! between scoring workers behind an [`Arc`].
//!
//! The [`FeatureSource`] trait abstracts where the features come from:
//!
//! - [`DirectorySource`]: reads `<clip>.txt` feature files on demand
//! - [`InMemorySource`]: pre-populated map, used in tests and toy runs
//!
//! A [`FeatureCache`] sits in front of a source so that clips referenced by
//! many triplets or pairs are only parsed once per evaluation run.

mod cache;
mod source;

use std::sync::Arc;

pub use cache::FeatureCache;
pub use source::{DirectorySource, InMemorySource};

use crate::error::Result;

/// A clip's continuous representation: an ordered sequence of
/// fixed-dimension real-valued vectors.
///
/// Frames are stored in a flat row-major buffer of `len * dim` values.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    clip_id: String,
    dim: usize,
    data: Vec<f64>,
}

impl FrameSequence {
    /// Create a sequence from a flat row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is zero or `data.len()` is not a multiple of `dim`.
    #[must_use]
    pub fn new(clip_id: impl Into<String>, dim: usize, data: Vec<f64>) -> Self {
        assert!(dim > 0, "frame dimensionality must be >= 1");
        assert!(
            data.len() % dim == 0,
            "frame buffer length must be a multiple of dim"
        );
        Self {
            clip_id: clip_id.into(),
            dim,
            data,
        }
    }

    /// Identifier of the clip this sequence was derived from.
    #[must_use]
    pub fn clip_id(&self) -> &str {
        &self.clip_id
    }

    /// Frame dimensionality.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Whether the sequence has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The `i`-th frame as a vector slice.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn frame(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterator over frames in time order.
    pub fn frames(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dim)
    }
}

/// A clip's discrete representation: an ordered sequence of symbol labels
/// plus the clip duration in seconds.
///
/// Symbols are drawn from a submission-specific alphabet; nothing is shared
/// across submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSequence {
    clip_id: String,
    symbols: Vec<String>,
    duration: f64,
}

impl UnitSequence {
    /// Create a unit sequence with the given clip duration in seconds.
    #[must_use]
    pub fn new(clip_id: impl Into<String>, symbols: Vec<String>, duration: f64) -> Self {
        Self {
            clip_id: clip_id.into(),
            symbols,
            duration,
        }
    }

    /// Identifier of the clip this sequence was derived from.
    #[must_use]
    pub fn clip_id(&self) -> &str {
        &self.clip_id
    }

    /// The symbol labels in time order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of unit frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the sequence has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Clip duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// Source of per-clip representations for one submission.
///
/// Implementations load on demand; callers that need a clip more than once
/// should go through a [`FeatureCache`].
pub trait FeatureSource: Send + Sync {
    /// The continuous representation of `clip_id`.
    ///
    /// Fails with [`crate::Error::ClipNotFound`] if the clip is absent from
    /// the submission.
    fn frame_sequence(&self, clip_id: &str) -> Result<Arc<FrameSequence>>;

    /// The discrete representation of `clip_id`.
    ///
    /// Fails with [`crate::Error::ClipNotFound`] if the clip is absent from
    /// the submission.
    fn unit_sequence(&self, clip_id: &str) -> Result<Arc<UnitSequence>>;
}
