//! Configuration file support for Glyco.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/glyco/config.toml`.

use crate::adherence::{validate_report_days, MAX_REPORT_DAYS};
use crate::{Error, Result};
use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub timezone: TimezoneConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Local data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Identity the remote store files entries under
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user_id: default_user_id(),
        }
    }
}

/// Remote store configuration. No directory means offline.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Offset used to decide calendar days and times of day
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TimezoneConfig {
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Adherence report configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("glyco")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_history_days() -> u32 {
    7
}

impl TimezoneConfig {
    /// Configured offset, or the host's current offset
    pub fn offset(&self) -> Result<FixedOffset> {
        match self.utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
                Error::Config(format!("UTC offset of {} minutes is out of range", minutes))
            }),
            None => Ok(Local::now().offset().fix()),
        }
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
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

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.data.user_id.trim().is_empty() {
            return Err(Error::Config("data.user_id cannot be blank".into()));
        }
        if validate_report_days(self.report.history_days).is_err() {
            return Err(Error::Config(format!(
                "report.history_days must be between 1 and {} (got {})",
                MAX_REPORT_DAYS, self.report.history_days
            )));
        }
        self.timezone.offset()?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("glyco").join("config.toml")
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

    /// Directory holding the local WAL files
    pub fn wal_dir(&self) -> PathBuf {
        self.data.data_dir.join("wal")
    }

    /// Path of the saved dosing profile
    pub fn profile_path(&self) -> PathBuf {
        self.data.data_dir.join("profile.json")
    }
}
