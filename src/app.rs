//! Main application: wires the decoder, panorama engine, compositor, and UI.

use std::path::Path;

use eframe::egui;
use glam::Vec2;
use log::{error, info, warn};

use crate::export::{save_snapshot, VideoRecorder};
use crate::panorama::{
    FrameController, ParticleController, ScrollTicker, VIEW_HEIGHT, VIEW_WIDTH,
};
use crate::project::PanoramaPreset;
use crate::render::{Compositor, SliceTexture, ViewParams, TARGET_HEIGHT, TARGET_WIDTH};
use crate::ui::ControlPanel;
use crate::video::{FrameCache, MovieDecoder};

/// Frames drained from the decoder per UI tick.
const DECODE_BUDGET: usize = 4;
/// Particle population while the overlay is enabled.
const PARTICLE_COUNT: usize = 24;

pub struct VideoPanApp {
    preset: PanoramaPreset,
    controller: FrameController<SliceTexture>,
    particles: Option<ParticleController<SliceTexture>>,
    ticker: ScrollTicker,
    decoder: Option<MovieDecoder>,
    compositor: Compositor,
    recorder: Option<VideoRecorder>,
    cache: FrameCache<SliceTexture>,
    control_panel: ControlPanel,
    preview_texture: Option<egui::TextureId>,
    drag_anchor: Option<(f32, f32)>,
    status: String,
}

impl VideoPanApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let preset = PanoramaPreset::default();
        let mut app = Self {
            ticker: ScrollTicker::new(preset.offset_velocity),
            preset,
            controller: FrameController::new(),
            particles: None,
            decoder: None,
            compositor: Compositor::new(),
            recorder: None,
            cache: FrameCache::new(),
            control_panel: ControlPanel::new(),
            preview_texture: None,
            drag_anchor: None,
            status: "Open a video to begin".to_string(),
        };

        if let Some(render_state) = cc.wgpu_render_state.clone() {
            app.compositor
                .initialize(render_state.device.clone(), render_state.queue.clone());
            if let Some(view) = app.compositor.target_view() {
                let id = render_state.renderer.write().register_native_texture(
                    &render_state.device,
                    view,
                    wgpu::FilterMode::Linear,
                );
                app.preview_texture = Some(id);
            }
        } else {
            warn!("WGPU render state not available - rendering disabled");
        }

        app
    }

    fn load_video(&mut self, path: &Path) {
        match MovieDecoder::open(path) {
            Ok(decoder) => {
                let info = *decoder.info();
                info!(
                    "loaded {} ({}x{}, {} frames @ {:.2} fps)",
                    path.display(),
                    info.width,
                    info.height,
                    info.total_frames,
                    info.frame_rate
                );
                self.status = format!(
                    "{} - {} frames @ {:.1} fps",
                    path.file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string()),
                    info.total_frames,
                    info.frame_rate
                );
                self.decoder = Some(decoder);
                self.cache.clear();
                self.controller = FrameController::new();
                self.particles = None;
                self.preset.start_frame = self.preset.start_frame.min(info.total_frames);
            }
            Err(e) => {
                error!("failed to open video: {e}");
                self.status = format!("Failed to open video: {e}");
            }
        }
    }

    /// Drain decoded frames, upload them, and keep the cache window-sized.
    fn pump_decoder(&mut self) {
        // Without GPU handles nothing can be uploaded, and an empty cache
        // would read as a perpetually unreachable window.
        if !self.compositor.is_initialized() {
            return;
        }

        let window = self.preset.to_params(0.0).window();

        let Some(decoder) = &mut self.decoder else {
            return;
        };

        let cache = &self.cache;
        if decoder.needs_restart(window.start, self.preset.max_frames.max(1), |n| {
            cache.contains(n)
        }) {
            if let Err(e) = decoder.seek(window.start) {
                error!("decoder seek failed: {e}");
                self.status = format!("Decoder error: {e}");
                self.decoder = None;
                return;
            }
        }

        for frame in decoder.poll(DECODE_BUDGET) {
            if !window.contains(&frame.index) {
                continue;
            }
            if let Some(texture) = self.compositor.upload_frame(&frame) {
                self.cache.insert(frame.index, texture);
            }
        }

        self.cache.retain_window(window.start, window.end);
    }

    fn update_particles(&mut self) {
        if !self.preset.particles_enabled {
            self.particles = None;
            return;
        }
        let Some(latest) = self.cache.latest() else {
            return;
        };
        match &mut self.particles {
            Some(particles) => {
                particles.update_particles(latest);
                particles.update();
            }
            None => {
                let mut particles = ParticleController::new(latest);
                particles.add_particles(PARTICLE_COUNT, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT));
                self.particles = Some(particles);
            }
        }
    }

    fn toggle_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            match recorder.finish() {
                Ok(frames) => self.status = format!("Recording finished ({frames} frames)"),
                Err(e) => {
                    error!("recording failed: {e}");
                    self.status = format!("Recording failed: {e}");
                }
            }
            return;
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("MP4 Video", &["mp4"])
            .set_file_name("videopan.mp4")
            .save_file()
        else {
            return;
        };

        let fps = self
            .decoder
            .as_ref()
            .map(|d| d.info().frame_rate)
            .unwrap_or(30.0);
        match VideoRecorder::start(&path, TARGET_WIDTH, TARGET_HEIGHT, fps) {
            Ok(recorder) => {
                self.recorder = Some(recorder);
                self.status = format!("Recording to {}", path.display());
            }
            Err(e) => {
                error!("failed to start recording: {e}");
                self.status = format!("Failed to start recording: {e}");
            }
        }
    }

    fn capture_frame(&mut self) {
        let Some(pixels) = self.compositor.read_back() else {
            return;
        };
        if let Some(recorder) = &mut self.recorder {
            if let Err(e) = recorder.add_frame(&pixels) {
                error!("recording frame failed: {e}");
                self.status = format!("Recording stopped: {e}");
                self.recorder = None;
            }
        }
    }

    fn save_snapshot_dialog(&mut self) {
        let Some(pixels) = self.compositor.read_back() else {
            self.status = "Nothing rendered yet".to_string();
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("videopan.png")
            .save_file()
        else {
            return;
        };
        match save_snapshot(&path, &pixels, TARGET_WIDTH, TARGET_HEIGHT) {
            Ok(()) => self.status = format!("Snapshot saved to {}", path.display()),
            Err(e) => {
                error!("snapshot failed: {e}");
                self.status = format!("Snapshot failed: {e}");
            }
        }
    }

    fn save_preset_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("VideoPan Preset", &["ron"])
            .set_file_name("preset.ron")
            .save_file()
        else {
            return;
        };
        match self.preset.save(&path) {
            Ok(()) => self.status = format!("Preset saved to {}", path.display()),
            Err(e) => {
                error!("preset save failed: {e}");
                self.status = format!("Preset save failed: {e}");
            }
        }
    }

    fn load_preset_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("VideoPan Preset", &["ron"])
            .pick_file()
        else {
            return;
        };
        match PanoramaPreset::load(&path) {
            Ok(preset) => {
                self.preset = preset;
                self.ticker.set_velocity(preset.offset_velocity);
                self.status = format!("Preset loaded from {}", path.display());
            }
            Err(e) => {
                error!("preset load failed: {e}");
                self.status = format!("Preset load failed: {e}");
            }
        }
    }

    fn open_video_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video Files", &["mov", "mp4", "avi", "mkv"])
            .pick_file()
        {
            self.load_video(&path);
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Video...").clicked() {
                        self.open_video_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save Preset...").clicked() {
                        self.save_preset_dialog();
                        ui.close_menu();
                    }
                    if ui.button("Load Preset...").clicked() {
                        self.load_preset_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Capture", |ui| {
                    let record_label = if self.recorder.is_some() {
                        "Stop Recording"
                    } else {
                        "Start Recording..."
                    };
                    if ui.button(record_label).clicked() {
                        self.toggle_recording();
                        ui.close_menu();
                    }
                    if ui.button("Snapshot...").clicked() {
                        self.save_snapshot_dialog();
                        ui.close_menu();
                    }
                });
            });
        });
    }

    /// Central preview: aspect-fit image plus camera drag and focal wheel.
    fn show_preview(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(available, egui::Sense::click_and_drag());
        ui.painter().rect_filled(rect, 0.0, egui::Color32::BLACK);

        let aspect = TARGET_WIDTH as f32 / TARGET_HEIGHT as f32;
        let fit = if rect.width() / rect.height() > aspect {
            egui::vec2(rect.height() * aspect, rect.height())
        } else {
            egui::vec2(rect.width(), rect.width() / aspect)
        };
        let image_rect = egui::Rect::from_center_size(rect.center(), fit);

        if let Some(texture_id) = self.preview_texture {
            ui.painter().image(
                texture_id,
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        // Dragging pans the camera: the scene follows the pointer, so the
        // camera moves opposite the drag, scaled from pixels to scene units.
        if response.drag_started() {
            if let Some(pointer) = response.interact_pointer_pos() {
                self.drag_anchor = Some((pointer.x, self.preset.camera_position));
            }
        }
        if response.dragged() {
            if let (Some((start_x, start_camera)), Some(pointer)) =
                (self.drag_anchor, response.interact_pointer_pos())
            {
                let scale = VIEW_WIDTH / image_rect.width().max(1.0);
                self.preset.camera_position = start_camera + (start_x - pointer.x) * scale;
            }
        }
        if response.drag_stopped() {
            self.drag_anchor = None;
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.preset.focal_distance =
                    (self.preset.focal_distance + scroll).clamp(1.0, 15000.0);
            }
        }
    }
}

impl eframe::App for VideoPanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep the window inside the movie.
        if let Some(decoder) = &self.decoder {
            let total = decoder.info().total_frames;
            if total > 0 {
                self.preset.start_frame = self.preset.start_frame.min(total.saturating_sub(1));
            }
        }

        let frame_offset = self.ticker.tick();
        let params = self.preset.to_params(frame_offset);

        self.pump_decoder();

        self.controller.update(&params);
        let cache = &self.cache;
        self.controller.bind_textures(|n| cache.get(n));

        self.update_particles();

        self.controller.draw(&mut self.compositor);
        if let Some(particles) = &self.particles {
            particles.draw(&mut self.compositor);
        }
        self.compositor.render(&ViewParams {
            camera_position: self.preset.camera_position,
            rotation_degrees: self.preset.frame_rotation,
        });

        if self.recorder.is_some() {
            self.capture_frame();
        }

        self.show_menu_bar(ctx);

        egui::SidePanel::right("control_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                let total_frames = self.decoder.as_ref().map(|d| d.info().total_frames);
                let response = self.control_panel.show(
                    ui,
                    &mut self.preset,
                    &mut self.ticker,
                    total_frames,
                    self.recorder.is_some(),
                );
                if response.open_video {
                    self.open_video_dialog();
                }
                if response.toggle_record {
                    self.toggle_recording();
                }
                if response.snapshot {
                    self.save_snapshot_dialog();
                }
                if response.save_preset {
                    self.save_preset_dialog();
                }
                if response.load_preset {
                    self.load_preset_dialog();
                }
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!(
                        "{} slices, offset {:.0}",
                        self.controller.len(),
                        self.ticker.value()
                    ));
                });
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                self.show_preview(ui);
            });

        // Animation runs continuously.
        ctx.request_repaint();
    }
}
