use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::paths;
use crate::source::SourceKind;

/// Top-level configuration structure loaded from `config.toml`.
///
/// Example TOML:
/// ```toml
/// [repo]
/// path = "~/activity"
/// push = true
///
/// [[sources]]
/// kind     = "gitlab"
/// username = "jane"
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// The repository commits are written into.
#[derive(Debug, Deserialize)]
pub struct RepoConfig {
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,
    /// Accept a directory that is not yet a repository and `git init` it.
    #[serde(default)]
    pub init: bool,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Push once after all sources are synchronized.
    #[serde(default)]
    pub push: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            init: false,
            user_name: None,
            user_email: None,
            push: false,
        }
    }
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

/// Representation of a single `[[sources]]` entry.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default)]
    pub instance: Option<String>,
    pub username: String,
    /// Commit message; also identifies this source's commits when the
    /// cursor is computed.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
}

/// Load and parse the configuration file.
///
/// `path` overrides the default location (see [`paths()`]).
///
/// # Errors
/// - Returns an error if the file cannot be read.
/// - Returns an error if parsing the TOML fails.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => paths()?.config,
    };
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    let mut cfg = parse_config(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    // a relative repo path is relative to the config file
    if cfg.repo.path.is_relative()
        && let Some(dir) = path.parent()
    {
        cfg.repo.path = dir.join(&cfg.repo.path);
    }
    Ok(cfg)
}

pub fn parse_config(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)?;
    Ok(cfg)
}
