//! Preset persistence for panorama settings.

mod preset;

pub use preset::PanoramaPreset;
