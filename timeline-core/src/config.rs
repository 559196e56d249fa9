use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::model::Granularity;

/// File looked up in the repository root when no explicit config is given
pub const REPO_CONFIG_FILE: &str = ".gitup-timeline.toml";

/// Timeline settings, loadable from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Commits requested per page
    pub page_size: usize,
    /// Seconds between repository status refreshes
    pub poll_interval_secs: u64,
    pub granularity: Granularity,
    pub layout: LayoutConfig,
}

/// Spacing of the positioned timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub origin_x: f64,
    /// y coordinate of the date labels; commits stack above it
    pub baseline_y: f64,
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            poll_interval_secs: 10,
            granularity: Granularity::Day,
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            baseline_y: 0.0,
            column_spacing: 240.0,
            row_spacing: 80.0,
        }
    }
}

impl TimelineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Explicit file if given, else the repository's config file if present,
    /// else defaults
    pub fn resolve(explicit: Option<&Path>, repo_root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let candidate: PathBuf = repo_root.join(REPO_CONFIG_FILE);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "loading repository config");
            return Self::load_from_file(&candidate);
        }

        Ok(Self::default())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                message: "must be at least 1 second".to_string(),
            });
        }
        let spacings = [
            ("layout.column_spacing", self.layout.column_spacing),
            ("layout.row_spacing", self.layout.row_spacing),
        ];
        for (field, value) in spacings {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("expected a positive number, got {}", value),
                });
            }
        }
        Ok(())
    }
}
