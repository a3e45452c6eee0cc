//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/regimen/config.toml`.

use crate::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub timeline: TimelineConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Timeline window used when no explicit range is requested
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
        }
    }
}

/// Output formatting
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// chrono format string for dates in text output
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("regimen")
}

fn default_window_days() -> u32 {
    90
}

fn default_date_format() -> String {
    "%Y-%m-%d".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("regimen")
            .join("config.toml")
    }

    /// Path of the ledger document inside the data directory
    pub fn ledger_path(&self) -> PathBuf {
        self.data.data_dir.join("ledger.json")
    }

    /// Reject values that would make the tools misbehave
    pub fn validate(&self) -> Result<()> {
        if self.timeline.default_window_days == 0 {
            return Err(Error::Config(
                "timeline.default_window_days must be at least 1".into(),
            ));
        }
        if self.display.date_format.trim().is_empty() {
            return Err(Error::Config("display.date_format must not be empty".into()));
        }
        if StrftimeItems::new(&self.display.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config(format!(
                "display.date_format is not a valid strftime pattern: {}",
                self.display.date_format
            )));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
