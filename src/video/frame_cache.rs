//! Frame-number-keyed texture cache.

use std::collections::HashMap;

/// Maps frame numbers to uploaded texture handles, retaining only what the
/// active window needs. Also tracks the most recently inserted frame, which
/// overlays (particles) bind to.
#[derive(Debug, Clone, Default)]
pub struct FrameCache<T> {
    frames: HashMap<u64, T>,
    latest: Option<(u64, T)>,
}

impl<T: Clone> FrameCache<T> {
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
            latest: None,
        }
    }

    pub fn insert(&mut self, frame: u64, texture: T) {
        if self.latest.as_ref().map_or(true, |(n, _)| frame >= *n) {
            self.latest = Some((frame, texture.clone()));
        }
        self.frames.insert(frame, texture);
    }

    pub fn get(&self, frame: u64) -> Option<T> {
        self.frames.get(&frame).cloned()
    }

    pub fn contains(&self, frame: u64) -> bool {
        self.frames.contains_key(&frame)
    }

    /// Most recently inserted texture, surviving window eviction.
    pub fn latest(&self) -> Option<T> {
        self.latest.as_ref().map(|(_, t)| t.clone())
    }

    /// Drop every entry outside `[start, end)`.
    pub fn retain_window(&mut self, start: u64, end: u64) {
        self.frames.retain(|&n, _| n >= start && n < end);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache: FrameCache<u32> = FrameCache::new();
        cache.insert(5, 55);
        assert_eq!(cache.get(5), Some(55));
        assert_eq!(cache.get(6), None);
    }

    #[test]
    fn test_latest_tracks_newest_frame() {
        let mut cache: FrameCache<u32> = FrameCache::new();
        cache.insert(10, 1);
        cache.insert(12, 2);
        cache.insert(11, 3); // older frame does not displace latest
        assert_eq!(cache.latest(), Some(2));
    }

    #[test]
    fn test_retain_window_evicts_outside() {
        let mut cache: FrameCache<u32> = FrameCache::new();
        for n in 0..10 {
            cache.insert(n, n as u32);
        }
        cache.retain_window(3, 7);
        assert_eq!(cache.len(), 4);
        assert!(cache.contains(3));
        assert!(cache.contains(6));
        assert!(!cache.contains(7));
        // Latest survives eviction for overlay use.
        assert_eq!(cache.latest(), Some(9));
    }

    #[test]
    fn test_clear_resets_latest() {
        let mut cache: FrameCache<u32> = FrameCache::new();
        cache.insert(1, 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.latest(), None);
    }
}
