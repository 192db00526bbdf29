//! Project-level configuration support
//!
//! Loads `ghstats.toml` from the working directory. It accepts the same
//! sections as the user config, plus the organizations to track and report
//! defaults.
//!
//! # Configuration Format
//!
//! ```toml
//! # ghstats.toml
//! organizations = ["xwiki", "xwiki-contrib"]
//!
//! [history]
//! clones_dir = "clones"
//!
//! [report]
//! default_scope = "xwiki/*"
//! top = 20
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use super::UserConfig;

pub const PROJECT_CONFIG_FILE: &str = "ghstats.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub settings: UserConfig,

    /// Organizations whose repositories are imported
    #[serde(default)]
    pub organizations: Vec<String>,

    #[serde(default)]
    pub report: ReportDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportDefaults {
    /// Scope used by `report` when none is given
    #[serde(default)]
    pub default_scope: Option<String>,

    /// Number of contributors shown
    #[serde(default)]
    pub top: Option<usize>,
}

/// Load the project config from `dir`, falling back to defaults when the
/// file is missing or unreadable.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    let toml_path = dir.join(PROJECT_CONFIG_FILE);
    if !toml_path.exists() {
        debug!("No project config found, using defaults");
        return ProjectConfig::default();
    }

    match load_toml_config(&toml_path) {
        Ok(config) => {
            debug!("Loaded project config from {}", toml_path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", toml_path.display(), e);
            ProjectConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}
