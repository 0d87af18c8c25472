//! Sliding-window frame layout and animation engine
//!
//! Owns the arrangement of movie frames as positioned, scaled quads: a bounded
//! window of frame indices is kept live, each frame's quad is laid out from the
//! global parameters (scroll offset, focal distance, camera pan) and eased
//! toward its destination every tick.

mod controller;
mod params;
mod particles;
mod slice;
mod ticker;

pub use controller::FrameController;
pub use params::{PanoramaParams, SLICE_HEIGHT, SLICE_SPACING, VIEW_HEIGHT, VIEW_WIDTH};
pub use particles::{Particle, ParticleController};
pub use slice::FrameSlice;
pub use ticker::{ScrollTicker, SCROLL_BOUND};

use glam::Vec2;

/// Sink for textured-quad draw commands issued by the engine.
///
/// The engine never talks to the GPU directly; each drawable entity emits
/// "draw this texture as a quad centered at `center` with `size`" commands
/// through this seam.
pub trait QuadRenderer<T> {
    fn draw_quad(&mut self, texture: &T, center: Vec2, size: Vec2);
}
