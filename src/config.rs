//! Configuration for deskreg.
//!
//! This module provides TOML configuration file loading from
//! `~/.deskreg/config.toml`.
//!
//! # Configuration File
//!
//! ```toml
//! # z value the registry counts up from; the first window gets 101
//! initial_z_index = 100
//!
//! # Log filter for ~/.deskreg/deskreg.log (RUST_LOG overrides it)
//! log_level = "info"
//!
//! [telemetry]
//! tracing = true
//! metrics = true
//!
//! [listing]
//! title_width = 24
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine config path")]
    NoConfigPath,
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Starting value of the registry's z counter
    pub initial_z_index: u64,
    /// tracing filter directive
    pub log_level: String,
    /// Observers attached to the registry
    pub telemetry: TelemetryConfig,
    /// `list` output settings
    pub listing: ListingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_z_index: 100,
            log_level: "info".to_string(),
            telemetry: TelemetryConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub tracing: bool,
    pub metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing: true,
            metrics: true,
        }
    }
}

/// Listing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub title_width: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { title_width: 24 }
    }
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(config) = Self::load_from(&path) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to the default path, returning where it went
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoConfigPath)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join("config.toml"))
    }
}

/// `~/.deskreg`, created on first use
pub fn data_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".deskreg");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.initial_z_index, 100);
        assert_eq!(config.log_level, "info");
        assert!(config.telemetry.tracing);
        assert!(config.telemetry.metrics);
        assert_eq!(config.listing.title_width, 24);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            "initial_z_index = 500\n[telemetry]\nmetrics = false\n",
        )
        .unwrap();

        assert_eq!(config.initial_z_index, 500);
        assert!(!config.telemetry.metrics);
        assert!(config.telemetry.tracing);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = Config::default();
        config.listing.title_width = 40;
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_to_then_load_from() {
        let dir = std::env::temp_dir().join(format!("deskreg-config-save-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.initial_z_index = 7;
        config.telemetry.tracing = false;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_from_errors() {
        let dir = std::env::temp_dir().join(format!("deskreg-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.toml");
        assert!(matches!(Config::load_from(&missing), Err(ConfigError::Read { .. })));

        let bad = dir.join("bad.toml");
        fs::write(&bad, "initial_z_index = \"high\"").unwrap();
        assert!(matches!(Config::load_from(&bad), Err(ConfigError::Parse { .. })));

        let good = dir.join("good.toml");
        fs::write(&good, "log_level = \"debug\"").unwrap();
        assert_eq!(Config::load_from(&good).unwrap().log_level, "debug");

        let unwritable = dir.join("no-such-dir").join("config.toml");
        assert!(matches!(Config::default().save_to(&unwritable), Err(ConfigError::Write { .. })));

        let _ = fs::remove_dir_all(&dir);
    }
}
