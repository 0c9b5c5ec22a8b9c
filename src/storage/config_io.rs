use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::model::config::AppConfig;

pub fn config_path() -> PathBuf {
    let mut path = super::app_dir();
    path.push("config.json");
    path
}

/// Read the config at `path`; a missing file means defaults.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&text)
        .with_context(|| format!("invalid config in {}", path.display()))?;

    Ok(config.sanitized())
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Load the user's config, writing a default one on first run.
///
/// Never fails: problems are logged and defaults used.
pub fn load_or_init() -> AppConfig {
    let path = config_path();

    if !path.exists() {
        let config = AppConfig::default();
        match save_config(&path, &config) {
            Ok(()) => info!("wrote default config to {}", path.display()),
            Err(e) => warn!("could not write default config: {e:#}"),
        }
        return config;
    }

    match load_config(&path) {
        Ok(config) => {
            info!("loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{e:#}; using defaults");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::RequestStyle;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("pathfinder-config-{}-{name}", std::process::id()));
        path.push("config.json");
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = load_config(&temp_path("missing")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("roundtrip");
        let mut cfg = AppConfig::default();
        cfg.endpoint.style = RequestStyle::Relay;
        cfg.story.max_choices = 5;

        save_config(&path, &cfg).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let path = temp_path("invalid");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ nope").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
