//! Configuration management for itermem.
//!
//! Configuration is loaded from the first file found, in order:
//! 1. `$ITERMEM_CONFIG`
//! 2. `<base dir>/config.toml`
//! 3. The platform config directory (`config.toml`)
//!
//! falling back to defaults. The base directory is taken from `--dir` or
//! `$ITERMEM_DIR`, then from `[paths].base_dir`, then `.itermem`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use itermem_core::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Paths
    pub paths: PathsConfig,

    /// Memory store tuning
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for itermem data
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Orchestrator state file holding the current iteration.
    /// Relative paths resolve against the base directory.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

// Default value functions
fn default_base_dir() -> PathBuf {
    PathBuf::from(".itermem")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            state_file: default_state_file(),
        }
    }
}

impl Config {
    /// Load configuration, applying a base directory override.
    pub fn load(dir_override: Option<&Path>) -> Result<Self> {
        let mut config = match Self::find_config_file(dir_override) {
            Some(path) => Self::load_from(&path)?,
            None => Config::default(),
        };

        if let Some(dir) = dir_override {
            config.paths.base_dir = dir.to_path_buf();
        }

        tracing::debug!("Using base directory {}", config.paths.base_dir.display());
        Ok(config)
    }

    /// Parse a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Locate the config file to use, if any.
    fn find_config_file(dir_override: Option<&Path>) -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ITERMEM_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let base = dir_override.map(Path::to_path_buf).unwrap_or_else(default_base_dir);
        let local = base.join("config.toml");
        if local.exists() {
            return Some(local);
        }

        Self::global_config_path().filter(|p| p.exists())
    }

    /// Platform config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "itermem", "itermem")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Directory holding the tier logs.
    pub fn memory_dir(&self) -> PathBuf {
        self.paths.base_dir.join("memory")
    }

    /// Resolved orchestrator state file.
    pub fn state_file(&self) -> PathBuf {
        self.paths.base_dir.join(&self.paths.state_file)
    }

    /// Candidate iteration output files, in lookup order.
    pub fn output_candidates(&self, iteration: u64) -> Vec<PathBuf> {
        let base = &self.paths.base_dir;
        vec![
            base.join("output").join(format!("iteration-{}.log", iteration)),
            base.join("output").join("last-output.log"),
            base.join("output.txt"),
        ]
    }
}
