//! Saved control-panel settings, serialized as RON.

use std::path::Path;

use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};

use crate::panorama::PanoramaParams;

/// Every panel-adjustable setting, in one serializable struct. The live panel
/// edits this directly; save/load round-trips it through a `.ron` file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaPreset {
    pub focal_distance: f32,
    pub frame_speed: f32,
    pub start_frame: u64,
    pub offset_velocity: f32,
    pub frame_rotation: f32,
    pub camera_position: f32,
    pub max_frames: usize,
    pub particles_enabled: bool,
}

impl Default for PanoramaPreset {
    fn default() -> Self {
        Self {
            focal_distance: 500.0,
            frame_speed: 5.0,
            start_frame: 1,
            offset_velocity: 1.0,
            frame_rotation: 90.0,
            camera_position: -1200.0,
            max_frames: 100,
            particles_enabled: false,
        }
    }
}

impl PanoramaPreset {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("failed to serialize preset")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write preset to {}", path.display()))?;
        info!("preset saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read preset from {}", path.display()))?;
        let preset = ron::from_str(&contents)
            .with_context(|| format!("failed to parse preset {}", path.display()))?;
        info!("preset loaded from {}", path.display());
        Ok(preset)
    }

    /// Snapshot the engine-facing parameters for one tick. The scroll offset
    /// is animated state, not a setting, so the caller passes it in.
    pub fn to_params(&self, frame_offset: f32) -> PanoramaParams {
        PanoramaParams {
            start_frame: self.start_frame,
            max_frames: self.max_frames.max(1),
            frame_offset,
            frame_speed: self.frame_speed,
            focal_distance: self.focal_distance,
            camera_position: self.camera_position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_roundtrip() {
        let preset = PanoramaPreset {
            focal_distance: 1234.0,
            frame_speed: 42.0,
            start_frame: 7,
            offset_velocity: -3.0,
            frame_rotation: 270.0,
            camera_position: 55.0,
            max_frames: 250,
            particles_enabled: true,
        };

        let path = std::env::temp_dir().join("videopan_preset_test.ron");
        preset.save(&path).unwrap();
        let loaded = PanoramaPreset::load(&path).unwrap();
        assert_eq!(loaded, preset);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_to_params_mapping() {
        let preset = PanoramaPreset {
            start_frame: 10,
            max_frames: 5,
            focal_distance: 800.0,
            ..Default::default()
        };
        let params = preset.to_params(123.0);
        assert_eq!(params.start_frame, 10);
        assert_eq!(params.max_frames, 5);
        assert_eq!(params.frame_offset, 123.0);
        assert_eq!(params.focal_distance, 800.0);
    }

    #[test]
    fn test_to_params_clamps_zero_max_frames() {
        let preset = PanoramaPreset {
            max_frames: 0,
            ..Default::default()
        };
        assert_eq!(preset.to_params(0.0).max_frames, 1);
    }
}
