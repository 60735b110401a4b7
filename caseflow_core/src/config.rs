//! TOML configuration.
//!
//! Read from `$XDG_CONFIG_HOME/caseflow/config.toml`; every section and key
//! is optional and falls back to its default, so a missing file is a valid
//! configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub rehab: RehabConfig,
}

/// Where the store, WAL and CSV exports live
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

/// Rehabilitation progression parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RehabConfig {
    /// Wall-clock hour (0-23) after which a completed plan day rolls over
    #[serde(default = "default_rollover_hour")]
    pub rollover_hour: u32,
}

impl Default for RehabConfig {
    fn default() -> Self {
        Self {
            rollover_hour: default_rollover_hour(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".local/share")
        })
        .join("caseflow")
}

fn default_rollover_hour() -> u32 {
    crate::progression::DEFAULT_ROLLOVER_HOUR
}

impl Config {
    /// Load from the standard config path, defaulting when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();
        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate a config file at an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject out-of-range values before they reach the decision core
    pub fn validate(&self) -> Result<()> {
        if self.rehab.rollover_hour >= 24 {
            return Err(Error::Config(format!(
                "rehab.rollover_hour must be below 24, got {}",
                self.rehab.rollover_hour
            )));
        }
        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").expect("HOME environment variable not set");
                PathBuf::from(home).join(".config")
            })
            .join("caseflow")
            .join("config.toml")
    }

    /// Write the configuration out, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, rendered)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rehab.rollover_hour, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let rendered = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(config.rehab.rollover_hour, parsed.rehab.rollover_hour);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[rehab]\nrollover_hour = 8\n").unwrap();
        assert_eq!(config.rehab.rollover_hour, 8);
        assert_eq!(config.data.data_dir, default_data_dir());
    }

    #[test]
    fn test_out_of_range_rollover_rejected() {
        let config: Config = toml::from_str("[rehab]\nrollover_hour = 24\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_validates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[rehab]\nrollover_hour = 30\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.rehab.rollover_hour = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.rehab.rollover_hour, 5);
    }
}
