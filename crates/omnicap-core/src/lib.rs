//! # OmniCAP Core
//!
//! Error handling and configuration shared by the OmniCAP command line tools.
//!
//! - **Errors**: `OmniCapError` covers configuration, codec and I/O failures
//!   and serializes for machine-readable reports.
//! - **Configuration**: YAML files with `OMNICAP__*` environment overrides,
//!   validated before use.
//!
//! ## Example
//!
//! ```
//! use omnicap_core::config::AppConfig;
//! use omnicap_cap::CapVersion;
//!
//! let config = AppConfig::from_yaml("codec:\n  default_target_version: \"1.1\"\n").unwrap();
//! assert_eq!(config.codec.default_target_version, CapVersion::V1_1);
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod error;

pub use config::{AppConfig, CodecConfig, LogFormat, LoggingConfig};
pub use error::{ConfigError, OmniCapError, Result};
