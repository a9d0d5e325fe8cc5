//! Bitrate estimation for discrete unit sequences.
//!
//! The estimate assumes i.i.d. symbol draws from the submission's empirical
//! distribution: Shannon entropy of the pooled symbol frequencies times the
//! frame rate. This is a deliberate simplification of the true information
//! rate (no sequential redundancy is modeled), kept for comparability with
//! the benchmark's published numbers, not a compressed-size measurement.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::UnitSequence;

/// Information-rate estimate for one submission track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitrateScore {
    /// Estimated information rate in bits per second.
    pub bits_per_second: f64,
    /// Shannon entropy of the symbol distribution, in bits per frame.
    pub entropy_bits: f64,
    /// Number of distinct symbols observed.
    pub alphabet_size: usize,
    /// Total unit frames across all sequences.
    pub frames: usize,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

/// Estimate the bitrate of a set of unit sequences pooled into one track.
///
/// `bitrate = H * n_frames / total_duration` with
/// `H = -sum(p_s * log2(p_s))` over the empirical symbol distribution.
/// Fails with [`Error::ZeroDuration`] when the sequences cover no time at
/// all (including the empty set).
pub fn estimate_bitrate<'a, I>(sequences: I) -> Result<BitrateScore>
where
    I: IntoIterator<Item = &'a UnitSequence>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut frames = 0usize;
    let mut duration = 0.0f64;

    for seq in sequences {
        for symbol in seq.symbols() {
            *counts.entry(symbol.as_str()).or_insert(0) += 1;
        }
        frames += seq.len();
        duration += seq.duration();
    }

    if duration <= 0.0 {
        return Err(Error::ZeroDuration);
    }

    let total = frames as f64;
    let mut entropy = 0.0;
    for &count in counts.values() {
        let p = count as f64 / total;
        entropy -= p * p.log2();
    }

    Ok(BitrateScore {
        bits_per_second: entropy * total / duration,
        entropy_bits: entropy,
        alphabet_size: counts.len(),
        frames,
        duration_seconds: duration,
    })
}
