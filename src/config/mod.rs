//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::slugify;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The team whose box scores are being tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Canonical team name, recorded in player team affiliations
    #[serde(default = "default_team_name")]
    pub name: String,

    /// Directory name under the data dir (derived from `name` when empty)
    #[serde(default)]
    pub slug: String,

    /// Accepted spellings of the team name in export titles
    #[serde(default = "default_variants")]
    pub variants: Vec<String>,
}

fn default_team_name() -> String {
    "Pretty Good".to_string()
}

fn default_variants() -> Vec<String> {
    vec![
        "pretty good".to_string(),
        "pretty-good".to_string(),
        "prettygood".to_string(),
    ]
}

impl TeamConfig {
    /// Directory name for this team's data.
    pub fn dir_name(&self) -> String {
        if self.slug.trim().is_empty() {
            slugify(&self.name)
        } else {
            slugify(&self.slug)
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            name: default_team_name(),
            slug: String::new(),
            variants: default_variants(),
        }
    }
}

/// Leaderboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Entries kept per category
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    3
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub team: TeamConfig,

    #[serde(default)]
    pub records: RecordsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            team: TeamConfig::default(),
            records: RecordsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Team name must not be empty".to_string(),
            ));
        }

        if self.team.dir_name().is_empty() {
            return Err(ConfigError::ValidationError(
                "Team slug must contain at least one letter or digit".to_string(),
            ));
        }

        if self.team.variants.iter().all(|v| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "At least one team name variant is required".to_string(),
            ));
        }

        if self.records.depth == 0 {
            return Err(ConfigError::ValidationError(
                "Records depth must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Root of this team's file set.
    pub fn team_dir(&self) -> PathBuf {
        self.data_dir.join(self.team.dir_name())
    }
}
