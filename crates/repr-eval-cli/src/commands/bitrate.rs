//! Bitrate command: quick information-rate estimate for a unit submission.

use std::path::Path;

use anyhow::{Context, Result};
use repr_eval::metrics::bitrate::estimate_bitrate;
use repr_eval::{DirectorySource, FeatureSource, dataset};

pub fn run(submission: &Path, clips: &Path, frame_shift: f64) -> Result<()> {
    let clip_ids = dataset::load_clip_list(clips)
        .with_context(|| format!("loading clip list from {}", clips.display()))?;

    let source = DirectorySource::new(submission).with_frame_shift(frame_shift);
    let sequences = clip_ids
        .iter()
        .map(|clip| source.unit_sequence(clip))
        .collect::<repr_eval::Result<Vec<_>>>()
        .context("loading unit sequences")?;

    let score = estimate_bitrate(sequences.iter().map(std::sync::Arc::as_ref))?;

    println!("clips:          {}", clip_ids.len());
    println!("frames:         {}", score.frames);
    println!("duration:       {:.2} s", score.duration_seconds);
    println!("alphabet size:  {}", score.alphabet_size);
    println!("entropy:        {:.4} bits/frame", score.entropy_bits);
    println!("bitrate:        {:.2} bits/s", score.bits_per_second);
    Ok(())
}
