//! Configuration management for the OmniCAP tools.
//!
//! This module supports:
//! - Loading from YAML files
//! - Environment variable overrides (`OMNICAP__SECTION__KEY`)
//! - Validation of codec and logging settings

use crate::error::{ConfigError, Result};
use omnicap_cap::CapVersion;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::Level;

/// Main application configuration.
///
/// # Examples
///
/// ```no_run
/// use omnicap_core::config::AppConfig;
///
/// // Load from file
/// let config = AppConfig::from_file("omnicap.yaml").unwrap();
///
/// // Validate before use
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Codec behaviour
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path.display().to_string()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate, layering `OMNICAP__*`
    /// environment variables over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or merged.
    pub fn from_config_builder<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            // e.g. OMNICAP__CODEC__PRETTY=false
            .add_source(
                config::Environment::with_prefix("OMNICAP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the log level is not a tracing level.
    pub fn validate(&self) -> Result<()> {
        self.logging.parse_level()?;
        Ok(())
    }
}

/// Codec settings used by the command line tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Version used by `convert` when none is given
    #[serde(
        default = "default_target_version",
        deserialize_with = "deserialize_version"
    )]
    pub default_target_version: CapVersion,

    /// Treat warnings as failures when computing the exit status
    #[serde(default)]
    pub warnings_as_errors: bool,

    /// Indent encoded XML
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_target_version() -> CapVersion {
    CapVersion::V1_2
}

fn default_true() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_target_version: default_target_version(),
            warnings_as_errors: false,
            pretty: true,
        }
    }
}

/// Accepts `"1.1"` as well as an unquoted `1.1`, which YAML and environment
/// parsing both turn into a float.
fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<CapVersion, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(f64),
    }

    let text = match Repr::deserialize(deserializer)? {
        Repr::Text(text) => text,
        Repr::Number(number) => format!("{:.1}", number),
    };
    text.parse().map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::invalid_value("logging.level", format!("Invalid log level: {}", self.level))
                .into()
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}
