//! Export configuration
//!
//! Every fixed name the exporter relies on lives here. Each field has a serde
//! default, so a TOML file only needs the keys it wants to override:
//!
//! ```toml
//! voice_bundle_marker = "general-voice-"
//! progress_interval = 500
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name looked up in the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Subdirectory of the per-user config directory
pub const CONFIG_DIR_NAME: &str = "manoexport";

// Default value functions for serde
fn default_asset_subdir() -> PathBuf {
    ["manosaba_Data", "StreamingAssets", "aa", "StandaloneWindows64"]
        .iter()
        .collect()
}
fn default_text_bundle_marker() -> String {
    "general-localization-zhhans-scripts-".to_string()
}
fn default_voice_bundle_marker() -> String {
    "general-voice-".to_string()
}
fn default_speaker_bundle() -> String {
    "general-localization-zhhans-text_assets_all.bundle".to_string()
}
fn default_speaker_asset() -> String {
    "CharacterNames".to_string()
}
fn default_csv_file_name() -> String {
    "dialogue.csv".to_string()
}
fn default_voices_dir_name() -> String {
    "voices".to_string()
}
fn default_progress_interval() -> usize {
    300
}

/// Names and thresholds used by an export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Bundle directory relative to the game root
    #[serde(default = "default_asset_subdir")]
    pub asset_subdir: PathBuf,
    /// Substring identifying dialogue-script bundles
    #[serde(default = "default_text_bundle_marker")]
    pub text_bundle_marker: String,
    /// Substring identifying voice bundles
    #[serde(default = "default_voice_bundle_marker")]
    pub voice_bundle_marker: String,
    /// Exact file name of the bundle holding the speaker table
    #[serde(default = "default_speaker_bundle")]
    pub speaker_bundle: String,
    /// Name of the text asset holding the speaker table
    #[serde(default = "default_speaker_asset")]
    pub speaker_asset: String,
    #[serde(default = "default_csv_file_name")]
    pub csv_file_name: String,
    #[serde(default = "default_voices_dir_name")]
    pub voices_dir_name: String,
    /// Log voice progress every N clips
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            asset_subdir: default_asset_subdir(),
            text_bundle_marker: default_text_bundle_marker(),
            voice_bundle_marker: default_voice_bundle_marker(),
            speaker_bundle: default_speaker_bundle(),
            speaker_asset: default_speaker_asset(),
            csv_file_name: default_csv_file_name(),
            voices_dir_name: default_voices_dir_name(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl ExportConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Explicit path, else the per-user config file if present, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!("[CONFIG] Loading config: {}", path.display());
            return Self::load(path);
        }

        match user_config_path() {
            Some(path) if path.is_file() => {
                tracing::info!("[CONFIG] Loading user config: {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn asset_root(&self, game_root: &Path) -> PathBuf {
        game_root.join(&self.asset_subdir)
    }
}

/// `<config dir>/manoexport/config.toml`, if the platform has a config dir
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
