use backpack_ui::device::DeviceClient;
use backpack_ui::gui::BackpackApp;
use backpack_ui::logging;
use backpack_ui::settings::{self, Settings, DEVICE_URL_ENV};
use eframe::egui;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(settings::default_path);
    let mut settings = Settings::load(&settings_path)?;
    if !settings_path.exists() {
        if let Err(err) = settings.save(&settings_path) {
            eprintln!("cannot write {}: {err}", settings_path.display());
        }
    }
    if let Ok(url) = std::env::var(DEVICE_URL_ENV) {
        settings.device_url = url;
    }

    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    tracing::info!(device = %settings.device_url, settings = %settings_path.display(), "starting");

    let client = DeviceClient::new(&settings.device_url, settings.request_timeout())?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 480.0])
            .with_min_inner_size([420.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Backpack",
        native_options,
        Box::new(move |cc| Box::new(BackpackApp::new(&cc.egui_ctx, settings, client))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
