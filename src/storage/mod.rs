pub mod config_io;
pub mod profile_store;
pub mod story_export;

use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "pathfinder";

/// Per-user directory holding the config, profile and UI settings.
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR_NAME);
    path
}
