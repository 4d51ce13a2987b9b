use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::TrackedPair;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub github: GithubConfig,
    pub server: ServerConfig,
    /// Ordered list of (subject, artifact) pairs to track. Both the backfill
    /// miner and the incremental updater walk this list in order.
    #[serde(default)]
    pub tracked: Vec<TrackedPair>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Settings for the commit-history API and raw-content host.
///
/// The defaults point at the Smart Data Models organization on GitHub, where
/// each subject lives in its own `dataModel.<subject>` repository and every
/// artifact declares its version in `<artifact>/schema.json`.
#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_raw_base")]
    pub raw_base: String,
    #[serde(default = "default_org")]
    pub org: String,
    /// Prefix joined with the subject to form the repository name.
    #[serde(default = "default_repo_prefix")]
    pub repo_prefix: String,
    /// File name, under the artifact directory, whose content declares the
    /// version token.
    #[serde(default = "default_schema_file")]
    pub schema_file: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            raw_base: default_raw_base(),
            org: default_org(),
            repo_prefix: default_repo_prefix(),
            schema_file: default_schema_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_string()
}
fn default_org() -> String {
    "smart-data-models".to_string()
}
fn default_repo_prefix() -> String {
    "dataModel.".to_string()
}
fn default_schema_file() -> String {
    "schema.json".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl GithubConfig {
    /// Repository name for a subject, e.g. `dataModel.Weather`.
    pub fn repo_name(&self, subject: &str) -> String {
        format!("{}{}", self.repo_prefix, subject)
    }

    /// Path of the tracked schema file inside the repository, e.g.
    /// `WeatherObserved/schema.json`. Changed-file entries from commit
    /// details are compared against this exact string.
    pub fn schema_path(&self, artifact: &str) -> String {
        format!("{}/{}", artifact, self.schema_file)
    }

    /// Bearer credential for API requests, if present in the environment.
    pub fn token(&self) -> Option<String> {
        std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.github.timeout_secs == 0 {
        anyhow::bail!("github.timeout_secs must be > 0");
    }

    if config.github.api_base.is_empty() || config.github.raw_base.is_empty() {
        anyhow::bail!("github.api_base and github.raw_base must not be empty");
    }

    for pair in &config.tracked {
        if pair.subject.is_empty() || pair.artifact.is_empty() {
            anyhow::bail!("tracked pairs must have a non-empty subject and artifact");
        }
    }

    Ok(config)
}
