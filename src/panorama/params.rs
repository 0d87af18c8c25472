//! Per-tick parameter snapshot for the panorama engine.

use serde::{Deserialize, Serialize};

/// Width of the orthographic view rectangle in scene units.
pub const VIEW_WIDTH: f32 = 1200.0;
/// Height of the orthographic view rectangle in scene units.
pub const VIEW_HEIGHT: f32 = 850.0;
/// Horizontal spacing between adjacent slices; also the widest a slice draws.
pub const SLICE_SPACING: f32 = 12.0;
/// Tallest a slice draws, on the camera axis.
pub const SLICE_HEIGHT: f32 = 720.0;

/// Scale applied to `frame_speed` when easing a slice toward its destination.
/// The resulting per-tick interpolation factor is clamped to [0, 1].
pub(crate) const EASE_RATE: f32 = 0.02;

/// Immutable snapshot of the global animation parameters for one tick.
///
/// The host gathers live panel values into one of these every frame and hands
/// it to [`FrameController::update`](super::FrameController::update); the
/// engine itself never holds references to UI state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanoramaParams {
    /// Index of the oldest active frame (leading edge of the window).
    pub start_frame: u64,
    /// Sliding-window size; the live slice count never exceeds this.
    pub max_frames: usize,
    /// Global horizontal scroll offset added to every slice's base coordinate.
    pub frame_offset: f32,
    /// Interpolation rate toward destination positions; 0 freezes animation.
    pub frame_speed: f32,
    /// Simulated camera-to-plane distance; must be positive. Larger values
    /// flatten the apparent scale differences between near and far slices.
    pub focal_distance: f32,
    /// Camera pan offset (left edge of the visible view rectangle).
    pub camera_position: f32,
}

impl Default for PanoramaParams {
    fn default() -> Self {
        Self {
            start_frame: 1,
            max_frames: 100,
            frame_offset: 0.0,
            frame_speed: 5.0,
            focal_distance: 500.0,
            camera_position: -1200.0,
        }
    }
}

impl PanoramaParams {
    /// Target window of active frame numbers, `[start_frame, start_frame + max_frames)`.
    pub fn window(&self) -> std::ops::Range<u64> {
        self.start_frame..self.start_frame + self.max_frames as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_range() {
        let params = PanoramaParams {
            start_frame: 10,
            max_frames: 5,
            ..Default::default()
        };
        assert_eq!(params.window(), 10..15);
    }

    #[test]
    fn test_defaults() {
        let params = PanoramaParams::default();
        assert_eq!(params.max_frames, 100);
        assert_eq!(params.focal_distance, 500.0);
        assert_eq!(params.camera_position, -1200.0);
    }
}
