//! Durable display configuration and the store that keeps it in lockstep
//! with the generated startup script.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{clamp_temp, script};

/// Durable display settings, one record per user profile.
///
/// Always fully populated: missing fields on load merge over these defaults,
/// and an unparseable file is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub night_light_on: bool,
    pub manual_temp: u32,
    pub brightness_percent: u32,
    pub monitor_transform: MonitorTransform,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            night_light_on: false,
            manual_temp: 4500,
            brightness_percent: 90,
            monitor_transform: MonitorTransform::Normal,
        }
    }
}

impl DisplayConfig {
    /// Clamp fields back into their documented domains.
    fn normalize(mut self) -> Self {
        self.manual_temp = clamp_temp(self.manual_temp);
        self.brightness_percent = self.brightness_percent.clamp(1, 100);
        self
    }
}

/// Monitor transform codes as understood by `hyprctl keyword monitor`.
///
/// Persisted as the ordinal 0–3; unknown ordinals decode to `Normal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum MonitorTransform {
    #[default]
    Normal,
    Left,
    Inverted,
    Right,
}

impl From<u8> for MonitorTransform {
    fn from(code: u8) -> Self {
        match code {
            1 => MonitorTransform::Left,
            2 => MonitorTransform::Inverted,
            3 => MonitorTransform::Right,
            _ => MonitorTransform::Normal,
        }
    }
}

impl From<MonitorTransform> for u8 {
    fn from(transform: MonitorTransform) -> Self {
        match transform {
            MonitorTransform::Normal => 0,
            MonitorTransform::Left => 1,
            MonitorTransform::Inverted => 2,
            MonitorTransform::Right => 3,
        }
    }
}

impl MonitorTransform {
    pub fn code(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            MonitorTransform::Normal => "Normal",
            MonitorTransform::Left => "Left",
            MonitorTransform::Inverted => "Inverted",
            MonitorTransform::Right => "Right",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error while accessing {path:?}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        StoreError::Io {
            source: err,
            path: path.into(),
        }
    }
}

/// Load and persist the display configuration.
///
/// Every save regenerates the startup script from the same record, so the
/// two can never be observed out of sync.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    state_path: PathBuf,
    script_path: PathBuf,
}

impl ConfigStore {
    pub fn new(state_path: impl Into<PathBuf>, script_path: impl Into<PathBuf>) -> Self {
        ConfigStore {
            state_path: state_path.into(),
            script_path: script_path.into(),
        }
    }

    /// Store rooted at the user's configuration directory, with the startup
    /// script where the compositor sources it.
    pub fn default_paths() -> Option<Self> {
        let config_dir = dirs::config_dir()?;
        Some(ConfigStore::new(
            config_dir.join("displayctl/state.json"),
            config_dir.join("hypr/apply-settings.sh"),
        ))
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// On-disk record merged over defaults. A missing or malformed file
    /// yields pure defaults; this never raises.
    pub fn load(&self) -> DisplayConfig {
        let raw = match fs::read_to_string(&self.state_path) {
            Ok(raw) => raw,
            Err(_) => return DisplayConfig::default(),
        };

        match serde_json::from_str::<DisplayConfig>(&raw) {
            Ok(config) => config.normalize(),
            Err(err) => {
                log::warn!(
                    "ignoring malformed state file {:?}: {err}",
                    self.state_path
                );
                DisplayConfig::default()
            }
        }
    }

    /// Persist the record and regenerate the startup script as one commit.
    pub fn save(&self, config: &DisplayConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::from_io(parent, err))?;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.state_path, json)
            .map_err(|err| StoreError::from_io(&self.state_path, err))?;

        script::write(&self.script_path, config)
    }
}
