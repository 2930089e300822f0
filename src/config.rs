use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::score::ScoringConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Where the documents live.
#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    pub root: PathBuf,
}

/// Bounds on a single scan.
#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// Concurrent per-file extraction workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Whole-scan time budget; on expiry the partial report is returned.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    /// Files larger than this are counted as scanned but never decoded.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            deadline_secs: default_deadline_secs(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_workers() -> usize {
    8
}
fn default_deadline_secs() -> u64 {
    30
}
fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    /// A config with defaults everywhere except the knowledge root.
    ///
    /// Used by `kbs --root <dir>` and by tests that don't want a TOML file.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            knowledge: KnowledgeConfig { root: root.into() },
            scan: ScanConfig::default(),
            server: ServerConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.scan.workers == 0 {
        anyhow::bail!("scan.workers must be > 0");
    }

    if config.scan.deadline_secs == 0 {
        anyhow::bail!("scan.deadline_secs must be > 0");
    }

    if config.scan.max_file_bytes == 0 {
        anyhow::bail!("scan.max_file_bytes must be > 0");
    }

    config
        .scoring
        .validate()
        .with_context(|| "Invalid [scoring] table")?;

    Ok(config)
}
