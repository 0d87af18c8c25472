//! VideoPan Library
//!
//! An interactive visual instrument that slices a movie into a scrolling,
//! rotatable arrangement of textured frame quads with simulated focal depth.

pub mod app;
pub mod export;
pub mod panorama;
pub mod project;
pub mod render;
pub mod ui;
pub mod video;

// Re-export commonly used types
pub use app::VideoPanApp;
pub use export::VideoRecorder;
pub use panorama::{FrameController, FrameSlice, PanoramaParams, ParticleController, ScrollTicker};
pub use project::PanoramaPreset;
pub use render::Compositor;
pub use video::MovieDecoder;
