use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::dedup::ScanMode;

/// User settings. The scan mode is the only engine-affecting setting and is
/// always passed into classification explicitly; nothing reads it ambiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan_mode: ScanMode,
    pub confirm_deletions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::Url,
            confirm_deletions: true,
        }
    }
}

impl Settings {
    /// Load settings from disk, falling back to defaults when the file does
    /// not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::settings_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Self::settings_path()?)
    }

    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    fn settings_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".bookmark-cleaner.json"))
    }
}
