//! Application configuration loaded from a TOML file.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! The file is looked up at `$STUDY_ASSISTANT_CONFIG`, falling back to
//! `study_assistant.toml` in the working directory.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "STUDY_ASSISTANT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "study_assistant.toml";

/// How far a wrong answer pushes a card down the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Back to `Initial` regardless of the current stage.
    Reset,
    /// Down a single rung.
    StepBack,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Reset
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Exponential smoothing factor applied to the confidence level.
    pub smoothing_factor: f64,
    pub failure_policy: FailurePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.3,
            failure_policy: FailurePolicy::Reset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub mastered_threshold: f64,
    pub struggling_threshold: f64,
    /// Cards with fewer reviews are neither mastered nor struggling.
    pub min_reviews: u32,
    /// Offset of the timezone used to bucket reviews into calendar days.
    pub utc_offset_minutes: i32,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            mastered_threshold: 0.8,
            struggling_threshold: 0.4,
            min_reviews: 2,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub scheduler: SchedulerConfig,
    pub statistics: StatisticsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            scheduler: SchedulerConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the env-var path or the default file.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }

        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let alpha = self.scheduler.smoothing_factor;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scheduler.smoothing_factor must be in (0, 1], got {alpha}"
            )));
        }

        let stats = &self.statistics;
        for (name, value) in [
            ("mastered_threshold", stats.mastered_threshold),
            ("struggling_threshold", stats.struggling_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "statistics.{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if stats.struggling_threshold >= stats.mastered_threshold {
            return Err(ConfigError::Invalid(
                "statistics.struggling_threshold must be below mastered_threshold".to_string(),
            ));
        }
        if stats.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid(format!(
                "statistics.utc_offset_minutes must be within one day, got {}",
                stats.utc_offset_minutes
            )));
        }

        Ok(())
    }
}
