//! Application configuration, loaded from an optional TOML file.
//!
//! Every key is optional; missing keys take the values the actuator
//! firmware was tuned against.
//!
//! ```toml
//! [pointer]
//! send_threshold = 4
//! tap_cool_down_ms = 500
//!
//! [arm]
//! send_threshold = 20
//! x_range = [-90, 90]
//!
//! [session]
//! idle_tick_ms = 10
//! ```

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use motion_core::{ArmConfig, PointerConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path:   PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Session-loop tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long the session waits for a frame before flushing scheduled
    /// commands (the tap click's release) on its own.
    pub idle_tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig { idle_tick_ms: 10 }
    }
}

/// Configuration for the full application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pointer: PointerConfig,
    pub arm:     ArmConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.check_ranges()
            .map_err(|reason| ConfigError::Invalid { path: path.to_path_buf(), reason })?;
        Ok(cfg)
    }

    /// Every arm range must be written low-to-high.
    fn check_ranges(&self) -> Result<(), String> {
        let arm = &self.arm;
        for (name, [lo, hi]) in [("x_range", arm.x_range), ("y_range", arm.y_range), ("z_range", arm.z_range)] {
            if lo > hi {
                return Err(format!("arm.{} = [{}, {}] is reversed", name, lo, hi));
            }
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        AppConfig::from_toml(&text, path)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => AppConfig::load(p),
            None    => Ok(AppConfig::default()),
        }
    }
}
