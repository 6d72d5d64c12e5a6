//! Persisted plugin settings
//!
//! Stored as a flat TOML file under the user's config directory. A missing
//! or unreadable file never stops the plugin; it falls back to defaults.

use crate::controller::profile::{CalibrationOffsets, ControllerType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SETTINGS_DIR: &str = "flightpad";
pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub controller_type: ControllerType,
    pub axis_offset: i32,
    pub button_offset: i32,

    /// Show the small mouse-mode indicator
    pub show_indicator: bool,
    pub indicator_x: i32,
    pub indicator_y: i32,

    /// Overrides the simulator's joystick nullzone when set
    pub nullzone: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            controller_type: ControllerType::default(),
            axis_offset: 0,
            button_offset: 0,
            show_indicator: true,
            indicator_x: 40,
            indicator_y: 40,
            nullzone: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn offsets(&self) -> CalibrationOffsets {
        CalibrationOffsets {
            axis_offset: self.axis_offset,
            button_offset: self.button_offset,
        }
    }

    pub fn set_offsets(&mut self, offsets: CalibrationOffsets) {
        self.axis_offset = offsets.axis_offset;
        self.button_offset = offsets.button_offset;
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the settings, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                debug!("Loaded settings: {:?}", settings);
                settings
            }
            Err(e) => {
                warn!("Ignoring settings file: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }
}
