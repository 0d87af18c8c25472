//! Parameter control panel
//!
//! Sliders and buttons for the live panorama settings.

use eframe::egui::{self, Slider, Ui};

use crate::panorama::{ScrollTicker, SCROLL_BOUND};
use crate::project::PanoramaPreset;

/// Actions requested from the panel this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanelResponse {
    pub open_video: bool,
    pub toggle_record: bool,
    pub snapshot: bool,
    pub save_preset: bool,
    pub load_preset: bool,
}

/// Right-hand settings panel editing the preset in place.
#[derive(Debug, Default)]
pub struct ControlPanel {}

impl ControlPanel {
    pub fn new() -> Self {
        Self {}
    }

    /// Show the panel and report any requested actions.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        preset: &mut PanoramaPreset,
        ticker: &mut ScrollTicker,
        total_frames: Option<u64>,
        recording: bool,
    ) -> PanelResponse {
        let mut response = PanelResponse::default();

        ui.heading("Settings");
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Focal Length:");
            ui.add(Slider::new(&mut preset.focal_distance, 1.0..=15000.0));
        });

        ui.horizontal(|ui| {
            ui.label("Camera Speed:");
            ui.add(Slider::new(&mut preset.frame_speed, 1.0..=75.0));
        });

        ui.horizontal(|ui| {
            ui.label("Jump To Frame:");
            let max = total_frames.unwrap_or(80_000).saturating_sub(1).max(1);
            ui.add(Slider::new(&mut preset.start_frame, 0..=max));
        });

        ui.horizontal(|ui| {
            ui.label("Offset Velocity:");
            if ui
                .add(Slider::new(&mut preset.offset_velocity, -100.0..=100.0))
                .changed()
            {
                ticker.set_velocity(preset.offset_velocity);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Rotation:");
            ui.add(Slider::new(&mut preset.frame_rotation, 0.0..=359.0).suffix("°"));
        });

        ui.horizontal(|ui| {
            ui.label("Frame Offset:");
            let mut offset = ticker.value();
            if ui
                .add(Slider::new(&mut offset, -SCROLL_BOUND..=SCROLL_BOUND))
                .changed()
            {
                ticker.set_value(offset);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Camera Position:");
            ui.add(egui::DragValue::new(&mut preset.camera_position).speed(10.0));
        });

        ui.horizontal(|ui| {
            ui.label("Total Frames:");
            ui.add(Slider::new(&mut preset.max_frames, 1..=400));
        });

        ui.checkbox(&mut preset.particles_enabled, "Particles");

        ui.separator();

        if ui.button("Open Video…").clicked() {
            response.open_video = true;
        }

        ui.horizontal(|ui| {
            let record_label = if recording { "Stop Recording" } else { "Record" };
            if ui.button(record_label).clicked() {
                response.toggle_record = true;
            }
            if ui.button("Snapshot").clicked() {
                response.snapshot = true;
            }
        });

        ui.horizontal(|ui| {
            if ui.button("Save Preset…").clicked() {
                response.save_preset = true;
            }
            if ui.button("Load Preset…").clicked() {
                response.load_preset = true;
            }
        });

        response
    }
}
