use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::model::profile::Profile;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the player's profile lives between runs.
pub trait ProfileStore {
    fn load(&self) -> Result<Option<Profile>, ProfileError>;
    fn save(&mut self, profile: &Profile) -> Result<(), ProfileError>;
    fn delete(&mut self) -> Result<(), ProfileError>;
}

/// A single JSON file named after the profile key.
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/pathfinder/<key>.json`
    pub fn in_app_dir(key: &str) -> Self {
        let mut path = super::app_dir();
        path.push(format!("{key}.json"));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Result<Option<Profile>, ProfileError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(profile)?)?;
        info!("saved profile for {} to {}", profile.username, self.path.display());
        Ok(())
    }

    fn delete(&mut self) -> Result<(), ProfileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("deleted profile at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the profile in memory only.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryProfileStore {
    pub profile: Option<Profile>,
}

#[cfg(test)]
impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<Option<Profile>, ProfileError> {
        Ok(self.profile.clone())
    }

    fn save(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        self.profile = Some(profile.clone());
        Ok(())
    }

    fn delete(&mut self) -> Result<(), ProfileError> {
        self.profile = None;
        Ok(())
    }
}
