//! YAML configuration for the `table-like` binary.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! defaults:
//!   partitions: INCLUDING
//!   constraints: EXCLUDING
//!   options: OVERWRITING
//! output:
//!   format: ddl
//! ```
//!
//! Features missing from `defaults` fall back to `INCLUDING`.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use table_like_core::{MergeDefaults, ValidationError};
use table_like_parser::output::OutputFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("invalid merge defaults: {0}")]
    InvalidDefaults(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Strategy for each feature no LIKE option names.
    #[serde(default)]
    pub defaults: MergeDefaults,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for LikeConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            defaults: MergeDefaults::default(),
            output: OutputConfig::default(),
        }
    }
}

impl LikeConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read,
    /// [`ConfigError::YamlError`] if parsing fails, or
    /// [`ConfigError::InvalidDefaults`] if a default pairs a feature with an
    /// illegal strategy.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.defaults.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.defaults.validate()?;
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
