//! Persistent user settings for crcsweep
//!
//! Settings are stored in a TOML configuration file at:
//! - Linux: `~/.config/crcsweep/crcsweep_config.toml`
//! - macOS: `~/Library/Application Support/crcsweep/crcsweep_config.toml`
//! - Windows: `%APPDATA%\crcsweep\crcsweep_config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [scan]
//! suffixes = [".mkv", ".mp4"]
//! require_checksum = false
//! sort = "natural"
//!
//! [verify]
//! block_size = "64K"
//!
//! [behavior]
//! quiet = false
//! ```

use crate::config::{parse_size, JobConfig, ScanConfig, SortOrder, DEFAULT_SUFFIXES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration file name
const CONFIG_FILE_NAME: &str = "crcsweep_config.toml";

/// Application name for config directory
const APP_NAME: &str = "crcsweep";

/// Default block size string
const DEFAULT_BLOCK_SIZE_STR: &str = "4K";

/// User settings loaded from configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Scan settings
    pub scan: ScanSettings,

    /// Verification settings
    pub verify: VerifySettings,

    /// Behavior settings
    pub behavior: BehaviorSettings,
}

/// Settings for directory scans
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    /// Case-sensitive file name suffixes to include
    pub suffixes: Vec<String>,

    /// Skip files whose names carry no CRC-32
    pub require_checksum: bool,

    /// Per-directory order: "lexicographic" or "natural"
    pub sort: SortOrder,
}

/// Settings for verification jobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerifySettings {
    /// Read block size (e.g., "4K", "64K", "1M")
    pub block_size: String,
}

/// General behavior settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BehaviorSettings {
    /// Whether to suppress non-error output
    pub quiet: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
            require_checksum: false,
            sort: SortOrder::default(),
        }
    }
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE_STR.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    ///
    /// Returns default settings if the file doesn't exist or can't be parsed
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load settings from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            tracing::debug!("No config path available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::try_load(&path) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load settings, reporting read and parse failures
    pub fn try_load(path: &std::path::Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(SettingsError::Deserialize)
    }

    /// Save settings to the configuration file
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        self.save_to_path(Self::config_path())
    }

    /// Save settings to a specific path
    pub fn save_to_path(&self, path: Option<PathBuf>) -> Result<PathBuf, SettingsError> {
        let path = path.ok_or(SettingsError::NoConfigDir)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(self).map_err(SettingsError::Serialize)?;

        std::fs::write(&path, contents).map_err(|e| SettingsError::Io {
            path: path.clone(),
            source: e,
        })?;

        tracing::info!("Saved settings to {:?}", path);
        Ok(path)
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Get the path to the configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Check if a configuration file exists
    pub fn config_exists() -> bool {
        Self::config_path().is_some_and(|p| p.exists())
    }

    /// Generate a default configuration file content as a string
    pub fn default_config_string() -> String {
        let default = Self::default();
        toml::to_string_pretty(&default)
            .unwrap_or_else(|_| String::from("# Failed to generate default config"))
    }

    /// Scan configuration described by these settings
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new()
            .suffixes(self.scan.suffixes.iter().cloned())
            .require_declared_checksum(self.scan.require_checksum)
            .sort_order(self.scan.sort)
    }

    /// Job configuration described by these settings
    ///
    /// An unparsable block size falls back to the default with a warning.
    pub fn job_config(&self) -> JobConfig {
        match parse_size(&self.verify.block_size) {
            Ok(size) => JobConfig::new().block_size(size),
            Err(e) => {
                tracing::warn!("Ignoring verify.block_size: {}", e);
                JobConfig::default()
            }
        }
    }
}

/// Errors that can occur when working with settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No configuration directory available
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Failed to read or write config file
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path that caused the error
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    Serialize(toml::ser::Error),

    /// Failed to deserialize settings
    #[error("Failed to parse settings: {0}")]
    Deserialize(toml::de::Error),
}
