//! VideoPan - Interactive Video Panorama
//!
//! Main entry point for the application.

use videopan::VideoPanApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Starting VideoPan v{}", env!("CARGO_PKG_VERSION"));

    // Configure native options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([960.0, 540.0])
            .with_title("VideoPan"),
        vsync: true,
        multisampling: 0,
        ..Default::default()
    };

    // Run the app
    eframe::run_native(
        "VideoPan",
        native_options,
        Box::new(|cc| Box::new(VideoPanApp::new(cc))),
    )
}
