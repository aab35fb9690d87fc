// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Stored as JSON in the platform config directory
//! (`~/.config/barscan/config.json` on Linux). Missing fields fall back to
//! their defaults, so a config file only needs the values it changes.

use crate::constants::{app_info, frames, timing};
use crate::decoder::DecoderConfig;
use crate::errors::{ConfigError, ConfigResult};
use crate::scanner::RetryPolicy;
use crate::storage::DumpNaming;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds between scan attempts
    pub interval_secs: f32,
    /// Start scanning as soon as the scanner is created
    pub auto_start: bool,
    /// Delay before the first automatic scan, in seconds
    pub startup_delay_secs: f32,
    /// Downscale large frames before decoding (faster, less detail)
    pub downscale_enabled: bool,
    /// Longest side after downscaling
    pub max_dimension: u32,
    /// Frames narrower than this are considered not ready
    pub min_ready_width: u32,
    /// What to try when the upright frame does not decode
    pub retry: RetryPolicy,
    /// Write a debug image whenever a frame fails to decode
    pub dump_on_failure: bool,
    /// Directory for debug images (platform data dir when unset)
    pub debug_dir: Option<PathBuf>,
    /// Debug image file naming
    pub dump_naming: DumpNaming,
    /// Decoder tuning
    pub decoder: DecoderConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: timing::DEFAULT_SCAN_INTERVAL_SECS,
            auto_start: true,
            startup_delay_secs: timing::DEFAULT_STARTUP_DELAY_SECS,
            downscale_enabled: false,
            max_dimension: frames::DEFAULT_MAX_DIMENSION,
            min_ready_width: frames::MIN_READY_WIDTH,
            retry: RetryPolicy::default(),
            dump_on_failure: true,
            debug_dir: None,
            dump_naming: DumpNaming::default(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_NAME).join(app_info::CONFIG_FILE))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when no
    /// file exists there
    pub fn load_or_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)
        };
        write().map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.interval_secs.is_finite() && self.interval_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "interval_secs must be a positive number, got {}",
                self.interval_secs
            )));
        }
        if !(self.startup_delay_secs.is_finite() && self.startup_delay_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "startup_delay_secs must not be negative, got {}",
                self.startup_delay_secs
            )));
        }
        if self.downscale_enabled && self.max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "max_dimension must be greater than zero".into(),
            ));
        }
        self.decoder.validate()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f32(self.interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs_f32(self.startup_delay_secs)
    }

    /// Directory debug images are written to
    pub fn debug_dir(&self) -> PathBuf {
        self.debug_dir
            .clone()
            .unwrap_or_else(crate::storage::default_debug_dir)
    }
}
