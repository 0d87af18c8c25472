//! A single movie frame rendered as a positioned, scaled quad.

use glam::Vec2;

use super::params::{PanoramaParams, EASE_RATE, SLICE_HEIGHT, VIEW_HEIGHT, VIEW_WIDTH};
use super::QuadRenderer;

/// One video frame as a quad in the panorama strip.
///
/// The quad's destination position and size are pure functions of the global
/// parameters plus the immutable `frame_number`; the current position eases
/// toward the destination each tick. The apparent width follows an
/// angle-of-view projection: a slice at lateral offset `d` from the camera
/// axis, seen from focal distance `f`, subtends `lens_angle = atan(d / f)` and
/// draws at `true_width * cos^2(lens_angle)` wide.
#[derive(Debug, Clone)]
pub struct FrameSlice<T> {
    frame_number: u64,
    texture: Option<T>,
    current_position: Vec2,
    destination_position: Vec2,
    velocity: Vec2,
    size: Vec2,
    width: f32,
    frame_offset: f32,
    frame_speed: f32,
    focal_distance: f32,
    true_width: f32,
    lens_angle: f32,
    max_width: f32,
}

impl<T> FrameSlice<T> {
    /// Create a slice for `frame_number`, placed directly at its destination.
    pub fn new(frame_number: u64, params: &PanoramaParams) -> Self {
        let mut slice = Self {
            frame_number,
            texture: None,
            current_position: Vec2::ZERO,
            destination_position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: Vec2::ZERO,
            width: 0.0,
            frame_offset: params.frame_offset,
            frame_speed: params.frame_speed,
            focal_distance: params.focal_distance,
            true_width: super::SLICE_SPACING,
            lens_angle: 0.0,
            max_width: super::SLICE_SPACING,
        };
        slice.update(params);
        let destination = slice.destination_position;
        slice.set_position(destination);
        slice
    }

    /// Index of the source movie frame this slice displays. Immutable.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn current_position(&self) -> Vec2 {
        self.current_position
    }

    pub fn destination_position(&self) -> Vec2 {
        self.destination_position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn lens_angle(&self) -> f32 {
        self.lens_angle
    }

    pub fn focal_distance(&self) -> f32 {
        self.focal_distance
    }

    pub fn frame_speed(&self) -> f32 {
        self.frame_speed
    }

    pub fn frame_offset(&self) -> f32 {
        self.frame_offset
    }

    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    /// Jump both current and destination position (initial placement, seeks).
    pub fn set_position(&mut self, position: Vec2) {
        self.current_position = position;
        self.destination_position = position;
        self.velocity = Vec2::ZERO;
    }

    /// Bind the texture for this slice's frame.
    pub fn set_frame_texture(&mut self, texture: T) {
        self.texture = Some(texture);
    }

    /// Stage the global scroll offset for the next layout pass.
    pub fn set_frame_offset(&mut self, offset: f32) {
        self.frame_offset = offset;
    }

    /// Recompute layout from the global parameters and ease toward it.
    pub fn update(&mut self, params: &PanoramaParams) {
        self.frame_speed = params.frame_speed.max(0.0);
        self.focal_distance = params.focal_distance.max(f32::EPSILON);
        self.frame_offset = params.frame_offset;

        let rel = self.frame_number as f32 - params.start_frame as f32;
        let base_x = rel * self.true_width + self.frame_offset;

        // Lateral offset from the camera axis (center of the view rectangle).
        let axis = params.camera_position + VIEW_WIDTH * 0.5;
        let lateral = base_x - axis;

        self.lens_angle = (lateral / self.focal_distance).atan();
        let foreshorten = self.lens_angle.cos();
        self.width = self.max_width * foreshorten * foreshorten;
        self.size = Vec2::new(self.width, SLICE_HEIGHT * foreshorten);

        self.destination_position = Vec2::new(base_x, VIEW_HEIGHT * 0.5);

        let ease = (self.frame_speed * EASE_RATE).clamp(0.0, 1.0);
        self.velocity = (self.destination_position - self.current_position) * ease;
        self.current_position += self.velocity;
    }

    /// Issue one textured-quad draw command. Slices with no texture bound yet
    /// draw nothing (the decoder has not reached their frame).
    pub fn draw<R: QuadRenderer<T>>(&self, renderer: &mut R) {
        if let Some(texture) = &self.texture {
            renderer.draw_quad(texture, self.current_position, self.size);
        }
    }
}
