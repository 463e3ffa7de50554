use squeezebox::{SETTINGS_FILE, Settings, SqueezeboxApp, spawn_engine};
use std::path::PathBuf;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("squeezebox=info")),
        )
        .init();

    let settings_path = PathBuf::from(SETTINGS_FILE);
    let settings = match Settings::load_or_default(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let frame_interval_ms = settings.motion.frame_interval_ms;
    let hard_mode = settings.play_through.hard_mode;
    let engine = spawn_engine(settings, settings_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("Squeezebox"),
        ..Default::default()
    };

    let _ = eframe::run_native(
        "Squeezebox",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(SqueezeboxApp::new(
                engine,
                frame_interval_ms,
                hard_mode,
            )))
        }),
    );
}
