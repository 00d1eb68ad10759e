// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `<config_dir>/photobooth/config.json`. Every field has a
//! default, so partial files load and a missing file yields [`Config::default`].

use crate::backends::camera::types::{FlashMode, LensFacing};
use crate::constants::{countdown, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory name under the platform config directory
const CONFIG_DIR_NAME: &str = "photobooth";

/// File name of the configuration file
const CONFIG_FILE_NAME: &str = "config.json";

/// Countdown timing and the symbol shown when the capture fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownSettings {
    /// Total countdown length in milliseconds
    pub total_ms: u64,
    /// Tick interval in milliseconds
    pub tick_ms: u64,
    /// Label shown on the capture tick
    pub done_label: String,
}

impl CountdownSettings {
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            total_ms: countdown::TOTAL_MS,
            tick_ms: countdown::TICK_MS,
            done_label: countdown::DONE_LABEL.to_string(),
        }
    }
}

/// Which camera to bind and at what preview size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Preferred lens facing
    pub facing: LensFacing,
    /// Explicit device path (overrides `facing` when set)
    pub device_path: Option<String>,
    /// Requested preview resolution (width, height); camera default when unset
    pub preview_resolution: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown timing
    pub countdown: CountdownSettings,
    /// How long a toast stays visible, in milliseconds
    pub toast_duration_ms: u64,
    /// Camera selection
    pub camera: CameraSettings,
    /// Flash mode of the still capture endpoint
    pub flash_mode: FlashMode,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown: CountdownSettings::default(),
            toast_duration_ms: timing::TOAST_LONG_MS,
            camera: CameraSettings::default(),
            flash_mode: FlashMode::Off,
            mirror_preview: false,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration, falling back to defaults
    ///
    /// A missing file is normal. A file that cannot be read or parsed is
    /// reported and replaced by defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Invalid configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Load the configuration from a file
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Reject settings the countdown cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.countdown.tick_ms == 0 {
            return Err(AppError::Config("countdown.tick_ms must be positive".into()));
        }
        if self.countdown.total_ms < self.countdown.tick_ms {
            return Err(AppError::Config(
                "countdown.total_ms must be at least one tick".into(),
            ));
        }
        Ok(())
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_tick_is_rejected() {
        let mut config = Config::default();
        config.countdown.tick_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_countdown_shorter_than_tick_is_rejected() {
        let mut config = Config::default();
        config.countdown.total_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"countdown": {"total_ms": 3000}}"#).unwrap();
        assert_eq!(config.countdown.total_ms, 3000);
        assert_eq!(config.countdown.tick_ms, countdown::TICK_MS);
        assert_eq!(config.countdown.done_label, ":)");
        assert_eq!(config.flash_mode, FlashMode::Off);
    }
}
