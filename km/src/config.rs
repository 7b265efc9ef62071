//! kmeans-spmd configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::update::UpdateRule;

/// Project-local config file name
pub const LOCAL_CONFIG: &str = ".kmeans.yml";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Dataset file
    pub input: Option<PathBuf>,

    /// Number of clusters (K)
    pub clusters: usize,

    /// Safety bound on the number of rounds
    pub max_iterations: u32,

    /// Group size, coordinator included
    pub workers: usize,

    /// Seed for initial centroid selection; random when unset
    pub seed: Option<u64>,

    pub update_rule: UpdateRule,

    /// Skip malformed dataset rows instead of failing
    pub skip_malformed: bool,

    /// Where to write the result dump
    pub output: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: Option<String>,
}

fn default_clusters() -> usize {
    debug!("default_clusters: called");
    crate::DEFAULT_CLUSTERS
}

fn default_max_iterations() -> u32 {
    debug!("default_max_iterations: called");
    crate::DEFAULT_MAX_ITERATIONS
}

fn default_workers() -> usize {
    debug!("default_workers: called");
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            clusters: default_clusters(),
            max_iterations: default_max_iterations(),
            workers: default_workers(),
            seed: None,
            update_rule: UpdateRule::default(),
            skip_malformed: false,
            output: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.kmeans.yml`, then the user config directory,
    /// then defaults. An explicit path that fails to load is an error; the
    /// implicit locations only warn.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::default_paths(),
        };

        candidates
            .into_iter()
            .find(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// Effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("kmeans-spmd").join("kmeans.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
