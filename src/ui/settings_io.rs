use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::storage::app_dir;
use crate::ui::settings::UiSettings;

fn settings_path() -> PathBuf {
    let mut path = app_dir();
    fs::create_dir_all(&path).ok();
    path.push("ui_settings.json");
    path
}

pub fn load_settings() -> UiSettings {
    let path = settings_path();
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str::<UiSettings>(&s).ok())
        .unwrap_or_default()
        .clamped()
}

pub fn save_settings(settings: &UiSettings) {
    let path = settings_path();
    match serde_json::to_string_pretty(settings) {
        Ok(json) => {
            if let Err(e) = fs::write(&path, json) {
                warn!("could not save UI settings to {}: {e}", path.display());
            }
        }
        Err(e) => warn!("could not serialize UI settings: {e}"),
    }
}
