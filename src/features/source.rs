//! Feature sources backed by a submission directory or an in-memory map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::features::{FeatureSource, FrameSequence, UnitSequence};

/// Default shift between two feature frames, in seconds.
pub const DEFAULT_FRAME_SHIFT: f64 = 0.01;

/// Reads per-clip feature files from a submission directory on demand.
///
/// Each clip is a `<clip_id>.txt` file under the root. Continuous features
/// are one whitespace-separated row of floats per frame; discrete features
/// are one symbol label per line. The duration of a discrete sequence is
/// `n_frames * frame_shift`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    frame_shift: f64,
}

impl DirectorySource {
    /// Create a source rooted at `root` with the default frame shift.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            frame_shift: DEFAULT_FRAME_SHIFT,
        }
    }

    /// Set the shift between two frames in seconds (used for unit durations).
    #[must_use]
    pub fn with_frame_shift(mut self, seconds: f64) -> Self {
        self.frame_shift = seconds;
        self
    }

    /// Root directory of the submission.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn clip_path(&self, clip_id: &str) -> Result<PathBuf> {
        let path = self.root.join(format!("{clip_id}.txt"));
        if !path.is_file() {
            return Err(Error::ClipNotFound(clip_id.to_string()));
        }
        Ok(path)
    }
}

impl FeatureSource for DirectorySource {
    fn frame_sequence(&self, clip_id: &str) -> Result<Arc<FrameSequence>> {
        let path = self.clip_path(clip_id)?;
        let text = std::fs::read_to_string(&path)?;
        let seq = parse_frames(clip_id, &path, &text)?;
        tracing::debug!(clip = clip_id, frames = seq.len(), dim = seq.dim(), "loaded frame sequence");
        Ok(Arc::new(seq))
    }

    fn unit_sequence(&self, clip_id: &str) -> Result<Arc<UnitSequence>> {
        let path = self.clip_path(clip_id)?;
        let text = std::fs::read_to_string(&path)?;

        let symbols: Vec<String> = text
            .split_whitespace()
            .map(|s| s.to_string())
            .collect();
        if symbols.is_empty() {
            return Err(Error::FeatureLoad {
                path,
                reason: "no unit labels found".to_string(),
            });
        }

        let duration = symbols.len() as f64 * self.frame_shift;
        Ok(Arc::new(UnitSequence::new(clip_id, symbols, duration)))
    }
}

/// Parse a whitespace-separated float matrix, one frame per line.
fn parse_frames(clip_id: &str, path: &Path, text: &str) -> Result<FrameSequence> {
    let mut dim = 0usize;
    let mut data = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let start = data.len();
        for field in line.split_whitespace() {
            let value: f64 = field.parse().map_err(|_| Error::FeatureLoad {
                path: path.to_path_buf(),
                reason: format!("line {}: '{field}' is not a float", line_no + 1),
            })?;
            data.push(value);
        }

        let row_dim = data.len() - start;
        if dim == 0 {
            dim = row_dim;
        } else if row_dim != dim {
            return Err(Error::FeatureLoad {
                path: path.to_path_buf(),
                reason: format!(
                    "line {}: expected {dim} columns, got {row_dim}",
                    line_no + 1
                ),
            });
        }
    }

    if data.is_empty() {
        return Err(Error::FeatureLoad {
            path: path.to_path_buf(),
            reason: "no frames found".to_string(),
        });
    }

    Ok(FrameSequence::new(clip_id, dim, data))
}

/// A pre-populated feature source.
///
/// Used by tests and toy evaluations where the features are built
/// programmatically rather than read from disk.
#[derive(Debug, Default)]
pub struct InMemorySource {
    frames: HashMap<String, Arc<FrameSequence>>,
    units: HashMap<String, Arc<UnitSequence>>,
}

impl InMemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame sequence, keyed by its clip id.
    pub fn insert_frames(&mut self, seq: FrameSequence) -> &mut Self {
        self.frames
            .insert(seq.clip_id().to_string(), Arc::new(seq));
        self
    }

    /// Add a unit sequence, keyed by its clip id.
    pub fn insert_units(&mut self, units: UnitSequence) -> &mut Self {
        self.units
            .insert(units.clip_id().to_string(), Arc::new(units));
        self
    }
}

impl FeatureSource for InMemorySource {
    fn frame_sequence(&self, clip_id: &str) -> Result<Arc<FrameSequence>> {
        self.frames
            .get(clip_id)
            .cloned()
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))
    }

    fn unit_sequence(&self, clip_id: &str) -> Result<Arc<UnitSequence>> {
        self.units
            .get(clip_id)
            .cloned()
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))
    }
}
