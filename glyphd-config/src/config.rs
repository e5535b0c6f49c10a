//! The `Config` struct and its persistence.
//!
//! Covers:
//! - `load` / `load_from` / `save_to` (YAML file I/O with atomic write)
//! - XDG-style path helpers (`config_path`, `config_dir`, `default_font_directory`)
//! - Semantic validation of numeric fields

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;
use crate::types::LogLevel;

/// Font service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for font files at startup.
    ///
    /// `None` resolves to [`Config::default_font_directory`].
    pub font_directory: Option<PathBuf>,

    /// Also register installed system fonts whose family the font directory
    /// does not already provide.
    pub system_fonts: bool,

    /// Maximum number of rendered glyphs kept in the glyph cache.
    #[serde(default = "defaults::glyph_cache_capacity")]
    pub glyph_cache_capacity: usize,

    /// Worker wait timeout between checks of its running flag (milliseconds).
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Interval between glyph cache statistics log lines (milliseconds).
    /// Zero disables the statistics.
    #[serde(default = "defaults::stats_interval_ms")]
    pub stats_interval_ms: u64,

    /// Grid-fit glyph outlines when rasterizing.
    #[serde(default = "defaults::hinting")]
    pub hinting: bool,

    /// Render multi-channel sub-pixel coverage masks instead of grayscale.
    pub subpixel: bool,

    /// Verbosity of the debug log file.
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_directory: None,
            system_fonts: false,
            glyph_cache_capacity: defaults::glyph_cache_capacity(),
            poll_interval_ms: defaults::poll_interval_ms(),
            stats_interval_ms: defaults::stats_interval_ms(),
            hinting: defaults::hinting(),
            subpixel: false,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating a default file if absent.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
        let config: Config = serde_yaml_ng::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        Ok(())
    }

    /// Check numeric fields that would leave the font worker unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.glyph_cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "glyph_cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the configuration file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("glyphd")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("glyphd")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Font directory used when `font_directory` is not set.
    pub fn default_font_directory() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("glyphd").join("fonts"))
            .unwrap_or_else(|| PathBuf::from("fonts"))
    }

    /// The font directory to scan, with `~/` expanded.
    pub fn resolved_font_directory(&self) -> PathBuf {
        match &self.font_directory {
            Some(dir) => match dir.strip_prefix("~") {
                Ok(rest) => dirs::home_dir()
                    .map(|home| home.join(rest))
                    .unwrap_or_else(|| dir.clone()),
                Err(_) => dir.clone(),
            },
            None => Self::default_font_directory(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `None` when statistics logging is disabled.
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_ms > 0).then(|| Duration::from_millis(self.stats_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.glyph_cache_capacity, 10_000);
        assert!(config.hinting);
        assert!(!config.subpixel);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = Config {
            glyph_cache_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("glyph_cache_capacity")
        ));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stats_interval_disabled_at_zero() {
        let config = Config {
            stats_interval_ms: 0,
            ..Config::default()
        };
        assert!(config.stats_interval().is_none());
        assert_eq!(
            Config::default().stats_interval(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_explicit_font_directory_wins() {
        let config = Config {
            font_directory: Some(PathBuf::from("/opt/fonts")),
            ..Config::default()
        };
        assert_eq!(config.resolved_font_directory(), PathBuf::from("/opt/fonts"));
    }

    #[test]
    fn test_unset_font_directory_uses_default() {
        let config = Config::default();
        assert_eq!(
            config.resolved_font_directory(),
            Config::default_font_directory()
        );
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml_ng::from_str("system_fonts: true\n").unwrap();
        assert!(config.system_fonts);
        assert_eq!(config.glyph_cache_capacity, 10_000);
        assert_eq!(config.poll_interval_ms, 100);
        assert!(config.hinting);
    }
}
