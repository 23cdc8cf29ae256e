//! # Fan-out Configuration
//!
//! Settings for a fan-out run are read from an optional TOML file and then
//! overridden by command-line flags. Every field has a default, so an empty file
//! (or no file at all) is a valid configuration.
//!
//! ```toml
//! tasks = 16
//! max_delay_ms = 200
//! log_level = "debug"
//! log_to_file = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TASKS: usize = 8;
pub const DEFAULT_MAX_DELAY_MS: u64 = 50;

/// Errors raised while loading or validating a [`FanOutConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path:?}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path:?}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("A fan-out needs at least one task")]
    NoTasks,
}

/// Settings for one fan-out run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FanOutConfig {
    /// Number of concurrent tasks, one completion mark each
    pub tasks: usize,
    /// Upper bound of the random delay each task sleeps before signalling
    pub max_delay_ms: u64,
    pub log_level: String,
    /// Write logs to a daily rolling file instead of stderr
    pub log_to_file: bool,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl FanOutConfig {
    /// Load a configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Check the settings the runner depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks == 0 {
            return Err(ConfigError::NoTasks);
        }
        Ok(())
    }
}
