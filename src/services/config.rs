use crate::core::{ExhaustiveOptions, FastOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config file not found: {path}")]
    NotFound { path: String },

    #[error("Config file already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Relax the threshold pass by pass until the grouping looks meaningful
    #[default]
    Exhaustive,
    /// Bucket first, then match within buckets at a single limit
    Fast,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Exhaustive => write!(f, "exhaustive"),
            Algorithm::Fast => write!(f, "fast"),
        }
    }
}

/// Settings for a grouping run, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub algorithm: Algorithm,
    pub ignore_pure_matches: bool,
    /// Loosest threshold for the exhaustive search, or the fixed limit for the fast grouper.
    pub lower_match_limit: i32,
    pub groups_must_outweigh_singles: bool,
    pub max_comparisons: Option<u64>,
    /// File extensions kept when grouping a directory listing. Empty keeps everything.
    pub extensions: Vec<String>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        let exhaustive = ExhaustiveOptions::default();
        Self {
            algorithm: Algorithm::default(),
            ignore_pure_matches: exhaustive.ignore_pure_matches,
            lower_match_limit: exhaustive.lower_match_limit,
            groups_must_outweigh_singles: exhaustive.groups_must_outweigh_singles,
            max_comparisons: exhaustive.max_comparisons,
            extensions: Vec::new(),
        }
    }
}

impl GroupingConfig {
    pub fn exhaustive_options(&self) -> ExhaustiveOptions {
        ExhaustiveOptions {
            ignore_pure_matches: self.ignore_pure_matches,
            lower_match_limit: self.lower_match_limit,
            groups_must_outweigh_singles: self.groups_must_outweigh_singles,
            max_comparisons: self.max_comparisons,
        }
    }

    pub fn fast_options(&self) -> FastOptions {
        FastOptions {
            lowest_match_limit: self.lower_match_limit,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// `<config_dir>/textgroup/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("textgroup").join("config.json"))
    }

    /// Load the effective config: `explicit` if given, else the default file if
    /// present, else built-in defaults. Also returns the file that was used.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let default_path = match Self::default_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("No default config location: {}", e);
                None
            }
        };
        Self::resolve_from(explicit, default_path.as_deref())
    }

    fn resolve_from(
        explicit: Option<&Path>,
        default_path: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            log::info!("Loaded config from {}", path.display());
            return Ok((config, Some(path.to_path_buf())));
        }

        match default_path {
            Some(path) if path.is_file() => {
                let config = Self::from_file(path)?;
                log::info!("Loaded config from {}", path.display());
                Ok((config, Some(path.to_path_buf())))
            }
            _ => {
                log::debug!("Using built-in config defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path, overwrite: bool) -> Result<(), ConfigError> {
        if path.exists() && !overwrite {
            return Err(ConfigError::AlreadyExists {
                path: path.display().to_string(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")?;
        Ok(())
    }
}
