//! Sliding-window owner of the live frame slices.

use std::collections::VecDeque;

use super::params::PanoramaParams;
use super::slice::FrameSlice;
use super::QuadRenderer;

/// Owns the bounded deque of live [`FrameSlice`]s and keeps it synchronized
/// with the target window `[start_frame, start_frame + max_frames)`.
///
/// Slices are stored in ascending frame order, contiguous with no gaps. Each
/// `update` reconciles membership first (evicting slices that left the window,
/// creating slices that entered it) and then runs the per-slice layout pass.
/// A frame that leaves the window and later re-enters gets a fresh slice with
/// no texture bound.
#[derive(Debug, Default)]
pub struct FrameController<T> {
    slices: VecDeque<FrameSlice<T>>,
}

impl<T> FrameController<T> {
    pub fn new() -> Self {
        Self {
            slices: VecDeque::new(),
        }
    }

    /// Reconcile membership with the target window, then lay out every slice.
    pub fn update(&mut self, params: &PanoramaParams) {
        let window = params.window();

        // Evict slices that fell off either edge.
        while self
            .slices
            .front()
            .is_some_and(|s| s.frame_number() < window.start)
        {
            self.slices.pop_front();
        }
        while self
            .slices
            .back()
            .is_some_and(|s| s.frame_number() >= window.end)
        {
            self.slices.pop_back();
        }

        // Fill in whatever the window now covers.
        let edges = self
            .slices
            .front()
            .zip(self.slices.back())
            .map(|(f, l)| (f.frame_number(), l.frame_number()));
        if let Some((first, last)) = edges {
            for n in (window.start..first).rev() {
                self.slices.push_front(FrameSlice::new(n, params));
            }
            for n in (last + 1)..window.end {
                self.slices.push_back(FrameSlice::new(n, params));
            }
        } else {
            for n in window {
                self.slices.push_back(FrameSlice::new(n, params));
            }
        }

        for slice in &mut self.slices {
            slice.update(params);
        }
    }

    /// Offer textures to slices that have none bound yet. `lookup` maps a
    /// frame number to its decoded texture, if available.
    pub fn bind_textures<F>(&mut self, lookup: F)
    where
        F: Fn(u64) -> Option<T>,
    {
        for slice in &mut self.slices {
            if slice.texture().is_none() {
                if let Some(texture) = lookup(slice.frame_number()) {
                    slice.set_frame_texture(texture);
                }
            }
        }
    }

    /// Draw every live slice in ascending frame order.
    pub fn draw<R: QuadRenderer<T>>(&self, renderer: &mut R) {
        for slice in &self.slices {
            slice.draw(renderer);
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn slices(&self) -> impl Iterator<Item = &FrameSlice<T>> {
        self.slices.iter()
    }

    /// Active frame numbers in ascending order.
    pub fn frame_numbers(&self) -> Vec<u64> {
        self.slices.iter().map(|s| s.frame_number()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn params(start_frame: u64, max_frames: usize) -> PanoramaParams {
        PanoramaParams {
            start_frame,
            max_frames,
            ..Default::default()
        }
    }

    #[test]
    fn test_update_builds_exact_window() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(10, 5));
        assert_eq!(controller.frame_numbers(), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_advancing_start_slides_window() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(10, 5));
        controller.update(&params(12, 5));
        assert_eq!(controller.frame_numbers(), vec![12, 13, 14, 15, 16]);
    }

    #[test]
    fn test_window_never_exceeds_max_frames() {
        let mut controller: FrameController<u32> = FrameController::new();
        for (start, max) in [(1, 100), (1, 10), (50, 10), (45, 3), (45, 200), (0, 1)] {
            controller.update(&params(start, max));
            assert!(controller.len() <= max);
            assert_eq!(controller.len(), max);
            assert_eq!(
                controller.frame_numbers(),
                (start..start + max as u64).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_rewinding_start_prepends_slices() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(20, 4));
        controller.update(&params(18, 4));
        assert_eq!(controller.frame_numbers(), vec![18, 19, 20, 21]);
    }

    #[test]
    fn test_disjoint_jump_rebuilds_window() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(10, 5));
        controller.update(&params(500, 5));
        assert_eq!(controller.frame_numbers(), vec![500, 501, 502, 503, 504]);
    }

    #[test]
    fn test_reentering_frame_gets_fresh_slice() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(10, 5));
        controller.bind_textures(|n| Some(n as u32));
        assert!(controller.slices().all(|s| s.texture().is_some()));

        // Frame 10 leaves the window, then re-enters: its texture is gone and
        // it spawns directly at its destination.
        controller.update(&params(11, 5));
        controller.update(&params(10, 5));
        let slice = controller
            .slices()
            .find(|s| s.frame_number() == 10)
            .unwrap();
        assert!(slice.texture().is_none());
        assert_eq!(slice.current_position(), slice.destination_position());
    }

    #[test]
    fn test_bind_textures_skips_bound_slices() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(0, 3));
        controller.bind_textures(|n| (n == 1).then_some(111));
        controller.bind_textures(|_| Some(999));
        let bound: Vec<Option<u32>> = controller.slices().map(|s| s.texture().copied()).collect();
        assert_eq!(bound, vec![Some(999), Some(111), Some(999)]);
    }

    #[test]
    fn test_params_propagate_to_every_slice() {
        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(5, 4));

        let mut updated = params(5, 4);
        updated.frame_offset = 250.0;
        updated.focal_distance = 2000.0;
        controller.update(&updated);

        for slice in controller.slices() {
            assert_eq!(slice.frame_offset(), 250.0);
            assert_eq!(slice.focal_distance(), 2000.0);
        }
    }

    #[test]
    fn test_draw_emits_one_quad_per_textured_slice() {
        struct Sink(Vec<u32>);
        impl QuadRenderer<u32> for Sink {
            fn draw_quad(&mut self, texture: &u32, _center: Vec2, _size: Vec2) {
                self.0.push(*texture);
            }
        }

        let mut controller: FrameController<u32> = FrameController::new();
        controller.update(&params(10, 4));
        controller.bind_textures(|n| (n % 2 == 0).then_some(n as u32));

        let mut sink = Sink(Vec::new());
        controller.draw(&mut sink);
        assert_eq!(sink.0, vec![10, 12]);
    }
}
