//! TOML configuration for the registry and its logging.
//!
//! ```toml
//! [conversion]
//! mode = "strict"
//! trim_whitespace = true
//!
//! [dispatch]
//! log_failures = false
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

use super::logging::{LogConfig, LogFormat, LogOutput};
use crate::core::registry::Settings;
use crate::errors::ConfigError;
use crate::variant::ConversionMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, Level};

/// File name searched for by [`ReflectConfig::discover`].
pub const CONFIG_FILE: &str = ".rtreflect.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectConfig {
    #[serde(default)]
    pub conversion: ConversionConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Mode used by `Variant::convert`, the dispatcher, property setters and views.
    #[serde(default)]
    pub mode: ConversionMode,

    /// Ignore surrounding whitespace when parsing text into numbers and booleans.
    #[serde(default = "default_true")]
    pub trim_whitespace: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Log failed invocations and property writes at debug level.
    #[serde(default = "default_true")]
    pub log_failures: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_false")]
    pub span_events: bool,

    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mode: ConversionMode::Lossy,
            trim_whitespace: true,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { log_failures: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Pretty,
            span_events: false,
            filter: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_level() -> String { "info".to_string() }

impl ReflectConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find `.rtreflect.toml` in the current directory or its parents,
    /// falling back to defaults.
    pub fn discover() -> Self {
        std::env::current_dir()
            .ok()
            .and_then(|dir| Self::discover_from(&dir))
            .map(|(_, config)| config)
            .unwrap_or_default()
    }

    /// Search upward from `start`. Unreadable or malformed files are skipped.
    pub fn discover_from(start: &Path) -> Option<(PathBuf, Self)> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return Some((config_path, config)),
                    Err(error) => {
                        debug!(target: "rtreflect::config", path = %config_path.display(), %error, "skipping config file");
                    }
                }
            }
            current = dir.parent();
        }

        None
    }

    /// Default configuration as TOML text
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Registry settings to pass to `configure` before freeze.
    pub fn settings(&self) -> Settings {
        Settings::from(self)
    }

    /// Logging setup for `init_logging`, writing to stderr.
    pub fn log_config(&self) -> LogConfig {
        let level = Level::from_str(&self.logging.level).unwrap_or(Level::INFO);
        LogConfig {
            level,
            format: self.logging.format,
            output: LogOutput::Stderr,
            span_events: self.logging.span_events,
            filter: self.logging.filter.clone(),
        }
    }
}
