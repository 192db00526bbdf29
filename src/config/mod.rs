//! Configuration module for ghstats
//!
//! This module handles:
//! - User-level settings (~/.config/ghstats/config.toml)
//! - Project-level settings (ghstats.toml)
//! - Environment overrides
//!
//! Project values win over user values; the environment wins over both.

mod project_config;
mod user_config;

pub use project_config::{load_project_config, ProjectConfig, ReportDefaults, PROJECT_CONFIG_FILE};
pub use user_config::{GitHubSettings, HistorySettings, StorageSettings, UserConfig};

use anyhow::Result;
use std::path::Path;

/// Effective configuration for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub settings: UserConfig,
    pub organizations: Vec<String>,
    pub report: ReportDefaults,
}

impl Config {
    /// Layer the user file (or `user_file` when given), the project file in
    /// `project_dir` and the process environment.
    pub fn load(project_dir: &Path, user_file: Option<&Path>) -> Result<Self> {
        let user = match user_file {
            Some(path) => UserConfig::from_file(path)?,
            None => match UserConfig::user_config_path().filter(|p| p.exists()) {
                Some(path) => UserConfig::from_file(&path)?,
                None => UserConfig::default(),
            },
        };
        Ok(Self::layer(
            user,
            load_project_config(project_dir),
            |name| std::env::var(name).ok(),
        ))
    }

    pub fn layer(
        user: UserConfig,
        project: ProjectConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut settings = user;
        settings.merge(project.settings);
        settings.apply_env(env);
        Self {
            settings,
            organizations: project.organizations,
            report: project.report,
        }
    }
}
