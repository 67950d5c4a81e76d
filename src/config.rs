//! Configuration file support.
//!
//! Settings are stored as versioned JSON. Every field has a serde default, so
//! files written by older versions (or edited by hand) load with the missing
//! values filled in.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Appearance and runtime preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Performance thresholds
    #[serde(default)]
    pub tuning: Tuning,
}

fn default_app_name() -> String {
    "Hajimi".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Canvas background color
    pub bg_color: String,

    /// Background dot color
    pub grid_color: String,

    /// Spacing of background dots in world units (0 hides the grid)
    pub grid_size: f32,

    /// Log verbosity level
    pub log_level: LogLevel,

    /// Number of image decoder threads
    pub decoder_threads: usize,

    /// Longest side, in pixels, of generated thumbnails
    pub thumbnail_max_size: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            bg_color: "#1e1e1e".to_string(),
            grid_color: "#333333".to_string(),
            grid_size: constants::DEFAULT_GRID_SIZE,
            log_level: LogLevel::default(),
            decoder_threads: constants::DEFAULT_DECODER_THREADS,
            thumbnail_max_size: constants::THUMBNAIL_MAX_SIZE,
        }
    }
}

/// Thresholds that trade responsiveness against memory and redraw load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Files loaded into the overview per folder
    pub max_items: usize,
    /// Item count below which culling is skipped
    pub cull_threshold: usize,
    /// Thumbnails applied per store flush
    pub thumbnail_batch_size: usize,
    /// Screen pixels added around the viewport before culling
    pub cull_margin_px: f32,
    /// Maximum visible items for full-resolution promotion
    pub high_res_visible_limit: usize,
    /// Camera idle time before promotion, in milliseconds
    pub settle_delay_ms: u64,
    /// Pointer travel separating a click from a drag, in screen pixels
    pub drag_threshold_px: f32,
    /// Grab radius of resize handles, in screen pixels
    pub handle_hit_radius_px: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_items: constants::MAX_OVERVIEW_ITEMS,
            cull_threshold: constants::CULL_THRESHOLD,
            thumbnail_batch_size: constants::THUMBNAIL_BATCH_SIZE,
            cull_margin_px: constants::CULL_MARGIN_PX,
            high_res_visible_limit: constants::HIGH_RES_VISIBLE_LIMIT,
            settle_delay_ms: constants::SETTLE_DELAY_MS,
            drag_threshold_px: constants::DRAG_THRESHOLD_PX,
            handle_hit_radius_px: constants::HANDLE_HIT_RADIUS_PX,
        }
    }
}

impl OverviewConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: Preferences::default(),
            tuning: Tuning::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "hajimi-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("hajimi").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("hajimi")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_path(path: &std::path::Path) -> Option<Self> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Try to load configuration from the default path.
    pub fn load_from_default_path() -> Option<Self> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Save configuration to `path`, creating parent directories if needed.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error("Configuration version {file_version} is newer than supported {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut config = OverviewConfig::new();
        config.preferences.grid_size = 64.0;
        config.tuning.max_items = 120;

        let json = config.to_json().unwrap();
        let back = OverviewConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = OverviewConfig::from_json(
            r##"{ "version": 1, "preferences": { "bg_color": "#000000", "log_level": "debug" } }"##,
        )
        .unwrap();

        assert_eq!(config.app_name, "Hajimi");
        assert_eq!(config.preferences.bg_color, "#000000");
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert_eq!(config.preferences.grid_color, "#333333");
        assert_eq!(config.tuning, Tuning::default());
        assert_eq!(config.tuning.max_items, 300);
        assert_eq!(config.tuning.thumbnail_batch_size, 15);
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = OverviewConfig::from_json(r#"{ "version": 99 }"#);
        assert!(matches!(
            result,
            Err(ConfigError::VersionTooNew {
                file_version: 99,
                supported_version: CONFIG_VERSION
            })
        ));
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(OverviewConfig::default_filename());

        assert!(OverviewConfig::load_from_path(&path).is_none());

        let config = OverviewConfig::new();
        config.save_to_path(&path).unwrap();
        assert_eq!(OverviewConfig::load_from_path(&path), Some(config));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(OverviewConfig::load_from_path(&path).is_none());
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    }
}
