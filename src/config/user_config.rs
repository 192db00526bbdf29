//! User-level configuration for ghstats
//!
//! Read from ~/.config/ghstats/config.toml and overridden by environment
//! variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::github::DEFAULT_API_URL;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub github: GitHubSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub history: HistorySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GitHubSettings {
    /// Personal access token
    pub token: Option<String>,

    /// Account the token belongs to
    pub login: Option<String>,

    /// REST endpoint (default: https://api.github.com)
    pub api_url: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Record database file
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistorySettings {
    /// Directory holding `<organization>/<repository>` clones
    pub clones_dir: Option<PathBuf>,
}

fn cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ghstats")
}

impl UserConfig {
    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded user config from {}", path.display());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ghstats").join("config.toml"))
    }

    /// Override settings from `GITHUB_TOKEN`, `GITHUB_LOGIN` and `GHSTATS_DB`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(login) = lookup("GITHUB_LOGIN") {
            self.github.login = Some(login);
        }
        if let Some(db) = lookup("GHSTATS_DB") {
            self.storage.db_path = Some(PathBuf::from(db));
        }
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: UserConfig) {
        if other.github.token.is_some() {
            self.github.token = other.github.token;
        }
        if other.github.login.is_some() {
            self.github.login = other.github.login;
        }
        if other.github.api_url.is_some() {
            self.github.api_url = other.github.api_url;
        }
        if other.github.timeout_secs.is_some() {
            self.github.timeout_secs = other.github.timeout_secs;
        }
        if other.storage.db_path.is_some() {
            self.storage.db_path = other.storage.db_path;
        }
        if other.history.clones_dir.is_some() {
            self.history.clones_dir = other.history.clones_dir;
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.github.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| cache_root().join("ghstats.redb"))
    }

    pub fn clones_dir(&self) -> PathBuf {
        self.history
            .clones_dir
            .clone()
            .unwrap_or_else(|| cache_root().join("clones"))
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if config_path.exists() {
            warn!("{} already exists, leaving it untouched", config_path.display());
        } else {
            let example = r#"# ghstats user configuration

[github]
# Personal access token; GITHUB_TOKEN takes precedence
# token = "ghp_..."
# login = "your-login"
# api_url = "https://api.github.com"
# timeout_secs = 30

[storage]
# db_path = "/var/cache/ghstats/ghstats.redb"

[history]
# Local clones, laid out as <clones_dir>/<organization>/<repository>
# clones_dir = "/var/cache/ghstats/clones"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}
