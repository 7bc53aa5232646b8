//! User settings
//!
//! Read from `--config`, or from `oscompose/config.yaml` in the user's
//! configuration directory when it exists. Command line flags override
//! anything set here.

use crate::emit::OutputFormat;
use crate::error::{OsComposeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "config.yaml";

/// oscompose settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directories build contexts may live under. Empty means the directory
    /// of the compose file.
    pub bases: Vec<PathBuf>,
    /// Default output format
    pub format: OutputFormat,
    /// Project name override
    pub project_name: Option<String>,
}

impl Settings {
    /// Read settings from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| OsComposeError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Per-user settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("oscompose").join(SETTINGS_FILE))
    }

    /// Settings from an explicit file, else the per-user file if present,
    /// else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Using settings from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Permitted build bases for a project in `project_dir`. Relative bases
    /// are taken relative to the project directory.
    pub fn bases_for(&self, project_dir: &Path) -> Vec<PathBuf> {
        if self.bases.is_empty() {
            return vec![project_dir.to_path_buf()];
        }
        self.bases
            .iter()
            .map(|base| {
                let base = project_dir.join(base);
                std::fs::canonicalize(&base).unwrap_or(base)
            })
            .collect()
    }
}
