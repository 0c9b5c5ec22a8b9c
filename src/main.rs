mod ui;
mod engine;
mod model;
mod storage;

use eframe::egui;

use crate::storage::config_io::load_or_init;
use crate::storage::profile_store::FileProfileStore;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = load_or_init();
    let store = FileProfileStore::in_app_dir(&config.profile_key);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Pathfinder")
            .with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Pathfinder",
        options,
        Box::new(|_cc| Ok(Box::new(ui::app::PathfinderApp::new(config, Box::new(store))))),
    )
}
