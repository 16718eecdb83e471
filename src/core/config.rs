//! Configuration module for the Live Photo sorter
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\live_photo_sort\config.toml
//! - Linux/macOS: ~/.config/live_photo_sort/config.toml

use crate::exif::reader::{DEFAULT_BATCH_SIZE, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application name used for config directory
const APP_NAME: &str = "live_photo_sort";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config").join(APP_NAME))
    }
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    Ok(config_dir)
}

/// Initialize the configuration file if it doesn't exist.
///
/// Returns the path to the config file.
pub fn init_config() -> Result<PathBuf, ConfigError> {
    let config_dir = ensure_config_dir()?;
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        let default_config = Config::generate_default_config();
        fs::write(&config_path, default_config)
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine configuration directory")]
    ConfigDirNotFound,

    #[error("Failed to read config file '{0}': {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file '{0}': {1}")]
    ParseError(PathBuf, String),

    #[error("Failed to write config file '{0}': {1}")]
    WriteError(PathBuf, String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source directory settings
    pub sources: SourcesConfig,

    /// Destination settings
    pub output: OutputConfig,

    /// exiftool invocation settings
    pub exiftool: ExiftoolConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Process lifecycle settings
    pub process: ProcessConfig,
}

/// Source directories to scan for Live Photo halves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Ordered list of roots; earlier roots win identifier collisions
    pub directories: Vec<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
        }
    }
}

/// Destination directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory matched pairs are moved into
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./LivePhotoPairs"),
        }
    }
}

/// exiftool invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExiftoolConfig {
    /// Binary name or full path
    pub binary: String,

    /// Files per exiftool call
    pub batch_size: usize,

    /// Per-batch timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExiftoolConfig {
    fn default() -> Self {
        Self {
            binary: "exiftool".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file in addition to the console
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("logs/live_photo_sort.log"),
        }
    }
}

/// Process lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Liveness marker written for external management (kill scripts etc.)
    pub pid_file: PathBuf,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from("logs/live_photo_sort.pid"),
        }
    }
}

impl Config {
    /// Load configuration from a specific file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from the standard location, or defaults when no
    /// file exists yet.
    pub fn load_default() -> Result<Self, ConfigError> {
        match get_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Save configuration to a specific file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))?;
        }

        fs::write(path, content)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))
    }

    /// Generate a commented default configuration file.
    pub fn generate_default_config() -> String {
        r#"# live_photo_sort configuration
#
# Matches Live Photo stills to their companion videos by ContentIdentifier
# and moves verified pairs into the destination directory.

[sources]
# Ordered list of source roots. Earlier roots win identifier collisions.
# directories = ["/Volumes/Archive/Photos", "/Volumes/Archive/Photos.backup"]
directories = []

[output]
# Destination directory for matched pairs (and the run manifest).
directory = "./LivePhotoPairs"

[exiftool]
# Binary name or full path.
binary = "exiftool"
# Files per exiftool call.
batch_size = 500
# Per-batch timeout in seconds.
timeout_secs = 300

[logging]
# Log level: error, warn, info, debug, trace
level = "info"
# Also write the log to a file.
log_to_file = false
log_file = "logs/live_photo_sort.log"

[process]
# Liveness marker, useful for `kill $(cat ...)`.
pid_file = "logs/live_photo_sort.pid"
"#
        .to_string()
    }
}
