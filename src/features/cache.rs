//! Per-run cache of loaded feature sequences.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::features::{FeatureSource, FrameSequence, UnitSequence};

/// Caches sequences loaded from a [`FeatureSource`] for the lifetime of one
/// evaluation run.
///
/// A clip referenced by many triplets or pairs is parsed once and shared.
/// The cache is owned by the run that created it and dropped with it; there
/// is no process-wide state. Load errors are not cached, so a transient
/// failure is retried on the next request.
pub struct FeatureCache {
    source: Arc<dyn FeatureSource>,
    frames: RwLock<HashMap<String, Arc<FrameSequence>>>,
    units: RwLock<HashMap<String, Arc<UnitSequence>>>,
}

impl FeatureCache {
    /// Create a cache in front of `source`.
    #[must_use]
    pub fn new(source: Arc<dyn FeatureSource>) -> Self {
        Self {
            source,
            frames: RwLock::new(HashMap::new()),
            units: RwLock::new(HashMap::new()),
        }
    }

    /// The continuous representation of `clip_id`, loading it if needed.
    pub fn frames(&self, clip_id: &str) -> Result<Arc<FrameSequence>> {
        if let Some(seq) = self
            .frames
            .read()
            .expect("feature cache lock poisoned")
            .get(clip_id)
        {
            return Ok(Arc::clone(seq));
        }

        // Loaded outside the lock; two racing workers may both parse the
        // clip, the first insert wins and both see an identical sequence.
        let seq = self.source.frame_sequence(clip_id)?;
        let mut map = self.frames.write().expect("feature cache lock poisoned");
        let entry = map.entry(clip_id.to_string()).or_insert(seq);
        Ok(Arc::clone(entry))
    }

    /// The discrete representation of `clip_id`, loading it if needed.
    pub fn units(&self, clip_id: &str) -> Result<Arc<UnitSequence>> {
        if let Some(units) = self
            .units
            .read()
            .expect("feature cache lock poisoned")
            .get(clip_id)
        {
            return Ok(Arc::clone(units));
        }

        let units = self.source.unit_sequence(clip_id)?;
        let mut map = self.units.write().expect("feature cache lock poisoned");
        let entry = map.entry(clip_id.to_string()).or_insert(units);
        Ok(Arc::clone(entry))
    }

    /// Number of cached sequences (frame and unit entries combined).
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.read().expect("feature cache lock poisoned").len()
            + self.units.read().expect("feature cache lock poisoned").len()
    }

    /// Whether the cache holds no sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached sequences.
    pub fn clear(&self) {
        self.frames
            .write()
            .expect("feature cache lock poisoned")
            .clear();
        self.units
            .write()
            .expect("feature cache lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::InMemorySource;

    fn test_cache() -> FeatureCache {
        let mut source = InMemorySource::new();
        source.insert_frames(FrameSequence::new("c1", 2, vec![1.0, 2.0]));
        source.insert_units(UnitSequence::new("c1", vec!["a".to_string()], 0.01));
        FeatureCache::new(Arc::new(source))
    }

    #[test]
    fn test_cache_hit_returns_same_sequence() {
        let cache = test_cache();
        let first = cache.frames("c1").unwrap();
        let second = cache.frames("c1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss_not_stored() {
        let cache = test_cache();
        assert!(cache.frames("missing").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_clear() {
        let cache = test_cache();
        cache.frames("c1").unwrap();
        cache.units("c1").unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
