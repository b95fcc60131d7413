//! Configuration file handling for face-check.
//!
//! Loads configuration from `<config dir>/face-check/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::ResolutionCandidate;
use crate::detect::{DEFAULT_THRESHOLD, DEFAULT_TICK_INTERVAL};
use crate::geometry::Ratio;
use crate::guide::GUIDE_FRACTION;

/// Configuration file structure for face-check.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default = "default_true")]
    pub audio: bool,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Width available for displaying the stream; wider streams are scaled down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_width: Option<u32>,
    /// Resolutions to try, highest first.
    #[serde(default = "ResolutionCandidate::defaults")]
    pub resolutions: Vec<ResolutionCandidate>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            audio: true,
            frame_rate: default_frame_rate(),
            display_width: None,
            resolutions: ResolutionCandidate::defaults(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DetectionConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// 0 waits for the model forever.
    #[serde(default = "default_model_load_timeout_secs")]
    pub model_load_timeout_secs: u64,
    #[serde(default = "default_guide_fraction")]
    pub guide_fraction: Ratio,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            threshold: default_threshold(),
            model_load_timeout_secs: default_model_load_timeout_secs(),
            guide_fraction: default_guide_fraction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_frame_rate() -> u32 {
    20
}

fn default_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL.as_millis() as u64
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

fn default_model_load_timeout_secs() -> u64 {
    30
}

fn default_guide_fraction() -> Ratio {
    GUIDE_FRACTION
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed or is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config.validate()?;
            Ok(config)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Reject settings the capture flow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolutions.is_empty() {
            return Err(ConfigError::Invalid(
                "camera.resolutions must list at least one resolution".to_string(),
            ));
        }
        if let Some(bad) = self
            .camera
            .resolutions
            .iter()
            .find(|r| r.width == 0 || r.height == 0)
        {
            return Err(ConfigError::Invalid(format!(
                "camera.resolutions contains an empty resolution ({})",
                bad
            )));
        }
        if self.detection.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "detection.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.detection.threshold == 0 {
            return Err(ConfigError::Invalid(
                "detection.threshold must be greater than 0".to_string(),
            ));
        }
        if !self.detection.guide_fraction.is_unit_fraction() {
            return Err(ConfigError::Invalid(format!(
                "detection.guide_fraction must be in (0, 1], got {}",
                self.detection.guide_fraction
            )));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.detection.interval_ms)
    }

    /// `None` means wait for the model indefinitely.
    pub fn model_load_timeout(&self) -> Option<Duration> {
        match self.detection.model_load_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Directory captured images are written to.
    pub fn capture_dir(&self) -> PathBuf {
        self.output.dir.clone().unwrap_or_else(default_capture_dir)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    SerializeError(toml::ser::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::SerializeError(source) => {
                write!(f, "Failed to serialize config: {}", source)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::SerializeError(source) => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("face-check").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/face-check/config.toml")
        })
}

/// Get the default directory for captured images.
pub fn default_capture_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("face-check").join("captures"))
        .unwrap_or_else(|| PathBuf::from("captures"))
}
