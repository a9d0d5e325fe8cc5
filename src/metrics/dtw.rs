//! Dynamic time warping between two variable-length sequences.

use crate::error::{Error, Result};
use crate::features::{FrameSequence, UnitSequence};
use crate::metrics::{DistanceMetric, frame_distance, symbol_distance};

/// Aligns two sequences and returns a normalized alignment cost.
///
/// The standard dynamic-programming recurrence is used:
/// `cost[i][j] = dist(a[i], b[j]) + min(cost[i-1][j], cost[i][j-1],
/// cost[i-1][j-1])`, with the first row and column accumulating
/// monotonically. The final cost is divided by `len(a) + len(b)` so costs
/// stay comparable across clips of different length.
///
/// This is the inner loop of the ABX task: one aligner is kept per worker
/// and its two DP row buffers are reused across calls, so alignment
/// allocates nothing after warm-up.
#[derive(Debug, Clone)]
pub struct DtwAligner {
    metric: DistanceMetric,
    prev: Vec<f64>,
    curr: Vec<f64>,
}

impl DtwAligner {
    /// Create an aligner using `metric` for frame distances.
    #[must_use]
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            prev: Vec::new(),
            curr: Vec::new(),
        }
    }

    /// The frame distance metric this aligner was built with.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Align two continuous sequences.
    ///
    /// Fails with [`Error::EmptySequence`] if either input has no frames and
    /// with [`Error::DimensionMismatch`] if the dimensionalities differ.
    pub fn align(&mut self, a: &FrameSequence, b: &FrameSequence) -> Result<f64> {
        check_nonempty(a)?;
        check_nonempty(b)?;
        if a.dim() != b.dim() {
            return Err(Error::DimensionMismatch {
                expected: a.dim(),
                actual: b.dim(),
            });
        }

        let metric = self.metric;
        self.run(a.len(), b.len(), |i, j| {
            frame_distance(metric, a.frame(i), b.frame(j))
        })
    }

    /// Align two discrete unit sequences under the 0/1 symbol distance.
    ///
    /// Fails with [`Error::EmptySequence`] if either input has no units.
    pub fn align_units(&mut self, a: &UnitSequence, b: &UnitSequence) -> Result<f64> {
        if a.is_empty() {
            return Err(Error::EmptySequence {
                clip: a.clip_id().to_string(),
            });
        }
        if b.is_empty() {
            return Err(Error::EmptySequence {
                clip: b.clip_id().to_string(),
            });
        }

        let (sa, sb) = (a.symbols(), b.symbols());
        self.run(sa.len(), sb.len(), |i, j| {
            Ok(symbol_distance(&sa[i], &sb[j]))
        })
    }

    /// Run the DP over a `rows x cols` cost matrix, two rows at a time.
    fn run<F>(&mut self, rows: usize, cols: usize, mut cost: F) -> Result<f64>
    where
        F: FnMut(usize, usize) -> Result<f64>,
    {
        self.prev.clear();
        self.prev.resize(cols, 0.0);
        self.curr.clear();
        self.curr.resize(cols, 0.0);

        self.prev[0] = cost(0, 0)?;
        for j in 1..cols {
            self.prev[j] = self.prev[j - 1] + cost(0, j)?;
        }

        for i in 1..rows {
            self.curr[0] = self.prev[0] + cost(i, 0)?;
            for j in 1..cols {
                let best = self.prev[j].min(self.curr[j - 1]).min(self.prev[j - 1]);
                self.curr[j] = cost(i, j)? + best;
            }
            std::mem::swap(&mut self.prev, &mut self.curr);
        }

        Ok(self.prev[cols - 1] / (rows + cols) as f64)
    }
}

fn check_nonempty(seq: &FrameSequence) -> Result<()> {
    if seq.is_empty() {
        return Err(Error::EmptySequence {
            clip: seq.clip_id().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(id: &str, dim: usize, data: &[f64]) -> FrameSequence {
        FrameSequence::new(id, dim, data.to_vec())
    }

    #[test]
    fn test_self_alignment_is_zero() {
        let s = seq("c1", 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        for metric in [DistanceMetric::Angular, DistanceMetric::Euclidean] {
            let mut aligner = DtwAligner::new(metric);
            assert_eq!(aligner.align(&s, &s).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_reversal_invariance() {
        let a = seq("a", 1, &[1.0, 2.0, 3.0, 4.0]);
        let b = seq("b", 1, &[2.0, 2.0, 5.0]);
        let a_rev = seq("a", 1, &[4.0, 3.0, 2.0, 1.0]);
        let b_rev = seq("b", 1, &[5.0, 2.0, 2.0]);

        let mut aligner = DtwAligner::new(DistanceMetric::Euclidean);
        let forward = aligner.align(&a, &b).unwrap();
        let reversed = aligner.align(&a_rev, &b_rev).unwrap();
        assert!((forward - reversed).abs() < 1e-12);
    }

    #[test]
    fn test_known_cost() {
        // Unit-distance frames: a=[0, 0], b=[0, 1]. The best path carries a
        // single mismatch of cost 1, normalized by len(a)+len(b)=4.
        let a = seq("a", 1, &[0.0, 0.0]);
        let b = seq("b", 1, &[0.0, 1.0]);
        let mut aligner = DtwAligner::new(DistanceMetric::Euclidean);
        assert!((aligner.align(&a, &b).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_different_lengths() {
        // b repeats the frames of a; warping should absorb the repetition.
        let a = seq("a", 1, &[1.0, 2.0]);
        let b = seq("b", 1, &[1.0, 1.0, 2.0, 2.0]);
        let mut aligner = DtwAligner::new(DistanceMetric::Euclidean);
        assert_eq!(aligner.align(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_sequence_fails() {
        let empty = seq("empty", 1, &[]);
        let s = seq("c1", 1, &[1.0]);
        let mut aligner = DtwAligner::new(DistanceMetric::Euclidean);
        assert!(matches!(
            aligner.align(&empty, &s).unwrap_err(),
            Error::EmptySequence { clip } if clip == "empty"
        ));
        assert!(matches!(
            aligner.align(&s, &empty).unwrap_err(),
            Error::EmptySequence { clip } if clip == "empty"
        ));
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let a = seq("a", 1, &[1.0]);
        let b = seq("b", 2, &[1.0, 2.0]);
        let mut aligner = DtwAligner::new(DistanceMetric::Euclidean);
        assert!(matches!(
            aligner.align(&a, &b).unwrap_err(),
            Error::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn test_degenerate_vector_propagates() {
        let a = seq("a", 2, &[0.0, 0.0]);
        let b = seq("b", 2, &[1.0, 0.0]);
        let mut aligner = DtwAligner::new(DistanceMetric::Angular);
        assert!(matches!(
            aligner.align(&a, &b).unwrap_err(),
            Error::DegenerateVector
        ));
    }

    #[test]
    fn test_unit_alignment() {
        let a = UnitSequence::new("a", vec!["x".into(), "y".into()], 0.02);
        let b = UnitSequence::new("b", vec!["x".into(), "x".into(), "y".into()], 0.03);
        let mut aligner = DtwAligner::new(DistanceMetric::Angular);
        assert_eq!(aligner.align_units(&a, &b).unwrap(), 0.0);

        let c = UnitSequence::new("c", vec!["z".into(), "z".into()], 0.02);
        assert!(aligner.align_units(&a, &c).unwrap() > 0.0);
    }

    #[test]
    fn test_unit_alignment_empty_fails() {
        let a = UnitSequence::new("a", vec![], 0.0);
        let b = UnitSequence::new("b", vec!["x".into()], 0.01);
        let mut aligner = DtwAligner::new(DistanceMetric::Angular);
        assert!(matches!(
            aligner.align_units(&a, &b).unwrap_err(),
            Error::EmptySequence { .. }
        ));
    }
}
