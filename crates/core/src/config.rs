//! TOML-based configuration for MergeDesk.
//!
//! Configuration is optional everywhere: every field has a default, so a
//! missing file yields a fully working [`AppConfig`]. The `init` command
//! writes a commented sample produced by [`sample_config`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::merge::{ConflictStyle, MergeLabels};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Merge behaviour settings.
    #[serde(default)]
    pub merge: MergeConfig,

    /// Backup storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Conflict marker style written into seeded results.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// Plain `<<<<<<<` / `=======` / `>>>>>>>` markers.
    #[default]
    Merge,
    /// Markers with an additional `|||||||` base section.
    Diff3,
}

/// Merge behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Label written into conflict markers for the local side.
    #[serde(default = "default_ours_label")]
    pub ours_label: String,

    /// Label written into conflict markers for the incoming side.
    #[serde(default = "default_theirs_label")]
    pub theirs_label: String,

    /// Conflict marker style: `merge` or `diff3`.
    #[serde(default)]
    pub conflict_style: MarkerStyle,
}

fn default_ours_label() -> String {
    "ours".into()
}
fn default_theirs_label() -> String {
    "theirs".into()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            ours_label: default_ours_label(),
            theirs_label: default_theirs_label(),
            conflict_style: MarkerStyle::default(),
        }
    }
}

impl MergeConfig {
    pub fn labels(&self) -> MergeLabels {
        MergeLabels {
            ours: self.ours_label.clone(),
            theirs: self.theirs_label.clone(),
        }
    }

    pub fn conflict_style(&self) -> ConflictStyle {
        match self.conflict_style {
            MarkerStyle::Merge => ConflictStyle::Merge,
            MarkerStyle::Diff3 => ConflictStyle::Diff3,
        }
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Backup storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for scratch backups. Defaults to the platform user-data
    /// `merges` directory when unset.
    #[serde(default)]
    pub merges_dir: Option<PathBuf>,

    /// Days after which `backups prune` removes entries by default.
    #[serde(default = "default_prune_days")]
    pub prune_after_days: u32,
}

fn default_prune_days() -> u32 {
    14
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            merges_dir: None,
            prune_after_days: default_prune_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validating
// ---------------------------------------------------------------------------

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// The conventional config location: `<user config dir>/mergedesk/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mergedesk").join("config.toml"))
    }

    /// Loads an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `path` when given, otherwise the conventional
    /// location if one exists there, otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => {
                debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validates that all fields are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge.ours_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "merge.ours_label".into(),
                detail: "label must not be empty".into(),
            });
        }
        if self.merge.theirs_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "merge.theirs_label".into(),
                detail: "label must not be empty".into(),
            });
        }
        if self.storage.prune_after_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.prune_after_days".into(),
                detail: "prune age must be > 0 days".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                detail: format!(
                    "unknown level '{}': expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

/// The commented sample written by `mergedesk init`.
pub fn sample_config() -> &'static str {
    r#"# MergeDesk configuration
# All settings are optional; the values below are the defaults.

[merge]
# Labels written into conflict markers.
ours_label = "ours"
theirs_label = "theirs"
# Conflict marker style: "merge" or "diff3" (adds a base section).
conflict_style = "merge"

[storage]
# Directory for scratch backups. Defaults to the platform user-data
# "merges" directory when unset.
# merges_dir = "/home/me/.local/share/mergedesk/merges"
# Default age cutoff for `mergedesk backups prune`.
prune_after_days = 14

[logging]
# Minimum log level: trace, debug, info, warn, error.
level = "warn"
"#
}
