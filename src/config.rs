//! TOML configuration of the whole pipeline.
//!
//! Every section and key is optional; anything left out keeps its default.
//!
//! ```toml
//! # bioseries.toml
//! [input]
//! file_pattern = "*.mat"
//! combine = true
//!
//! [aliases]
//! biomass = ["biomass", "OD600", "vcd"]
//!
//! [extraction]
//! batch_index = 0
//! column_index = 2
//! max_depth = 5
//!
//! [cleaning]
//! remove_outliers = true
//! outlier_z_threshold = 3.0
//!
//! [cleaning.substrate_estimate]
//! initial_substrate = 10.0
//! biomass_yield = 0.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extract::ExtractorConfig;
use crate::preprocess::PreprocessConfig;
use crate::schema::NameAliasTable;

/// Errors loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which files to read and how to merge them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Glob pattern matched against file names in the data directory
    pub file_pattern: String,
    /// Concatenate experiments into one dataset
    pub combine: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file_pattern: "*.csv".to_string(),
            combine: true,
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File discovery and merging
    pub input: InputConfig,
    /// Per-role name overrides
    pub aliases: NameAliasTable,
    /// Extractor tunables
    pub extraction: ExtractorConfig,
    /// Cleaning settings
    pub cleaning: PreprocessConfig,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
