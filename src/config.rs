//! Runner configuration
//!
//! Optional TOML configuration for hosts that want to pin the binary
//! location, override the strategy order, or tune the event bus. Every
//! field has a sensible default and a missing or unreadable file falls
//! back to those defaults with a warning, so configuration is never
//! required to use the crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatch::Strategy;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// File that could not be parsed
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },
    /// A field value is out of range
    #[error("invalid config field '{field}': {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

fn default_event_capacity() -> usize {
    256
}

/// Configuration for the execution facade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Explicit FFmpeg binary path; overrides the injected resolver
    pub binary_path: Option<PathBuf>,
    /// Explicit strategy order; `None` uses the capability probe
    pub strategy_order: Option<Vec<Strategy>>,
    /// Shell program for the shell-wrapped strategy
    pub shell: Option<PathBuf>,
    /// Buffer capacity of the execution event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            strategy_order: None,
            shell: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when the
    /// file is absent or unreadable
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Default config file location (`<config dir>/ffrunner/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ffrunner").join("config.toml"))
    }

    /// Validate field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(order) = &self.strategy_order {
            if order.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "strategy_order",
                    reason: "must list at least one strategy".to_string(),
                });
            }
        }
        Ok(())
    }
}
