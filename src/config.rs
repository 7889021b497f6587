//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Graph and live-query options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Check literal property values against their declared kind
    pub validate_literal_types: bool,

    /// Drop a channel once its last subscriber unwatches
    pub prune_empty_channels: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            validate_literal_types: true,
            prune_empty_channels: false,
        }
    }
}

impl GraphConfig {
    pub fn from_yaml_str(source: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }
}
