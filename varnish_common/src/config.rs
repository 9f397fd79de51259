//! Configuration loading traits and types.
//!
//! This module provides the TOML configuration layer used by the
//! `varnish_cfg` tool and by [`HostFacts`] loading.
//!
//! # Usage
//!
//! ```rust,no_run
//! use varnish_common::config::{load_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_config(Path::new("varnish.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::DEFAULT_SERVICE_NAME;
use crate::facts::HostFacts;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "varnish-cfg"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier used in log output.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[storage]` section: storage specs to normalize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub specs: Vec<String>,
}

/// `[runtime]` section: runtime options for the server command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub options: Vec<String>,
}

/// Top-level configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "varnish-cfg"
///
/// [facts]
/// memorysize_mb = 16384.0
/// [facts.mountpoints]
/// "/var/lib/varnish" = 8589934592
///
/// [storage]
/// specs = ["malloc,10%", "file,/var/lib/varnish,50%"]
///
/// [runtime]
/// options = ["-a :6081", "-p thread_pools=4"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarnishConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Inline host facts; a facts file given on the command line wins.
    #[serde(default)]
    pub facts: Option<HostFacts>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl VarnishConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if let Some(facts) = &self.facts {
            facts
                .validate()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }
        if self.storage.specs.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "storage specs cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a [`VarnishConfig`] from a TOML file.
pub fn load_config(path: &Path) -> Result<VarnishConfig, ConfigError> {
    let config = VarnishConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(SharedConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/varnish.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.shared.service_name, DEFAULT_SERVICE_NAME);
        assert!(config.facts.is_none());
        assert!(config.storage.specs.is_empty());
        assert!(config.runtime.options.is_empty());
    }

    #[test]
    fn test_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"
service_name = "edge-01"

[facts]
memorysize_mb = 16384.0

[facts.mountpoints]
"/var/tmp" = 10737418240

[storage]
specs = ["malloc,10%", "file,/var/tmp,50%"]

[runtime]
options = ["-a :6081", "-j unix,user=vcache"]
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "edge-01");
        let facts = config.facts.unwrap();
        assert_eq!(facts.memorysize_mb, 16384.0);
        assert_eq!(facts.mountpoints.get("/var/tmp"), Some(10737418240));
        assert_eq!(config.storage.specs.len(), 2);
        assert_eq!(config.runtime.options[1], "-j unix,user=vcache");
    }

    #[test]
    fn test_blank_storage_spec_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[storage]\nspecs = [\"malloc\", \"  \"]\n").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
