//! CLI command definitions and handlers

mod authors;
mod output;
mod report;
mod repos;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use crate::config::{Config, UserConfig, PROJECT_CONFIG_FILE};
use crate::git::GitHistory;
use crate::github::{GitHubClient, PlatformClient};
use crate::import::Importer;
use crate::models::RepositoryRef;
use crate::scope::RepositoryScope;
use crate::store::RedbStore;

/// ghstats - Contributor statistics across git history and GitHub
#[derive(Parser, Debug)]
#[command(name = "ghstats")]
#[command(
    version,
    about = "Reconcile contributor identities from git history and GitHub, and rank contributors by commits",
    after_help = "\
Examples:
  ghstats repos import xwiki             Store the repositories of an organization
  ghstats authors import                 Record commit authors from local clones
  ghstats authors enrich                 Fill author profiles from GitHub
  ghstats committers import              Flag repository collaborators as committers
  ghstats link                           Propagate profiles across aliases
  ghstats report 'xwiki/*' --top 20      Top contributors of an organization"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// User config file (default: ~/.config/ghstats/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing ghstats.toml
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage stored repositories
    Repos {
        #[command(subcommand)]
        action: ReposAction,
    },

    /// Manage stored authors
    Authors {
        #[command(subcommand)]
        action: AuthorsAction,
    },

    /// Import committer status from repository collaborators
    Committers {
        #[command(subcommand)]
        action: CommittersAction,
    },

    /// Link author aliases until nothing changes
    Link,

    /// Rank contributors of a repository scope by commit count
    #[command(after_help = "\
Scope syntax: comma separated organization/repository items, '*' for all
repositories of an organization, e.g. 'xwiki/*,xwiki-contrib/application-forum'")]
    Report {
        /// Repository scope (default: [report] default_scope from ghstats.toml)
        scope: Option<String>,

        /// Only count commits made on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Number of contributors to show (0 = all)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Show the remaining GitHub API quota
    RateLimit,

    /// Manage configuration (init, show)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReposAction {
    /// Store the repositories of one or more organizations
    Import {
        /// Organizations (default: organizations from ghstats.toml)
        organizations: Vec<String>,

        /// Replace stored records that differ
        #[arg(long)]
        overwrite: bool,
    },
    /// List stored repositories
    List,
    /// Delete every stored repository
    Delete,
}

#[derive(Subcommand, Debug)]
pub enum AuthorsAction {
    /// Record commit authors of every stored repository
    Import,
    /// Fill author profiles from GitHub
    Enrich {
        /// Look up every author and replace existing profile values
        #[arg(long)]
        overwrite: bool,
    },
    /// Create an author from a GitHub account
    Create {
        /// GitHub login
        login: String,

        /// Email used when the account hides its email
        #[arg(long, default_value = "")]
        email: String,

        /// Replace existing profile values
        #[arg(long)]
        overwrite: bool,
    },
    /// List stored authors
    List {
        /// Only authors contributing to this scope
        #[arg(long)]
        scope: Option<String>,
    },
    /// Delete every stored author
    Delete,
}

#[derive(Subcommand, Debug)]
pub enum CommittersAction {
    /// Flag collaborators as committers
    Import {
        /// Single repository (organization/repository); default: all stored
        #[arg(long)]
        repo: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize config file with example settings
    Init,
    /// Show the effective configuration and paths
    Show,
}

/// Everything a command needs: configuration and an open record store.
pub(crate) struct Session {
    pub config: Config,
    pub store: RedbStore,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config = Config::load(&cli.project_dir, cli.config.as_deref())?;
        let db_path = config.settings.db_path();
        let store = RedbStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        Ok(Self { config, store })
    }

    pub fn importer(&self) -> Importer<'_> {
        Importer::new(&self.store)
    }

    pub fn github(&self) -> GitHubClient {
        let settings = &self.config.settings;
        GitHubClient::new(
            settings.api_url(),
            settings.token().map(str::to_string),
            settings.timeout(),
        )
    }

    pub fn history(&self) -> GitHistory {
        GitHistory::new(self.config.settings.clones_dir())
    }

    /// Parse `input`, falling back to the project's default scope.
    pub fn scope(&self, input: Option<&str>) -> Result<RepositoryScope> {
        let input = input
            .or(self.config.report.default_scope.as_deref())
            .context("No scope given and no [report] default_scope configured")?;
        Ok(RepositoryScope::parse(input)?)
    }
}

/// Parse a single `organization/repository` argument.
fn parse_repository(input: &str) -> Result<RepositoryRef> {
    let (organization, repository) = input
        .split_once('/')
        .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/') && *r != "*")
        .with_context(|| format!("Expected organization/repository, got [{}]", input))?;
    Ok(RepositoryRef::new(organization, repository))
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { action } = &cli.command {
        return run_config_action(action, &cli);
    }

    let session = Session::open(&cli)?;
    match cli.command {
        Commands::Repos { action } => repos::run(&session, action),
        Commands::Authors { action } => authors::run(&session, action),
        Commands::Committers {
            action: CommittersAction::Import { repo },
        } => {
            let client = session.github();
            let importer = session.importer();
            let batch = match repo {
                Some(repo) => importer.import_committers(&client, &parse_repository(&repo)?)?,
                None => importer.import_all_committers(&client)?,
            };
            output::print_batch("Committers", &batch);
            Ok(())
        }
        Commands::Link => {
            let batch = session.importer().link()?;
            output::print_batch("Linked authors", &batch);
            Ok(())
        }
        Commands::Report {
            scope,
            since,
            format,
            top,
        } => report::run(&session, scope.as_deref(), since.as_deref(), &format, top),
        Commands::RateLimit => {
            let limit = session.github().rate_limit()?;
            output::print_rate_limit(&limit);
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn run_config_action(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!("Config initialized at: {}", style(path.display()).cyan());
            println!("\nOr set the token via environment:");
            println!("  export GITHUB_TOKEN=\"ghp_...\"");
            Ok(())
        }
        ConfigAction::Show => show_config(cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.project_dir, cli.config.as_deref())?;
    let found = |exists: bool| if exists { "" } else { " (not found)" };

    println!("Config paths:");
    if let Some(user_path) = cli.config.clone().or_else(UserConfig::user_config_path) {
        println!("  User:    {}{}", user_path.display(), found(user_path.exists()));
    }
    let project_path = cli.project_dir.join(PROJECT_CONFIG_FILE);
    println!(
        "  Project: {}{}",
        project_path.display(),
        found(project_path.exists())
    );
    println!();

    let settings = &config.settings;
    println!("GitHub:");
    println!("  API:     {}", settings.api_url());
    println!(
        "  Token:   {}",
        if settings.token().is_some() {
            style("set").green()
        } else {
            style("not set").yellow()
        }
    );
    if let Some(login) = &settings.github.login {
        println!("  Login:   {}", login);
    }
    println!("  Timeout: {}s", settings.timeout().as_secs());
    println!("Storage:   {}", settings.db_path().display());
    println!("Clones:    {}", settings.clones_dir().display());
    if !config.organizations.is_empty() {
        println!("Organizations: {}", config.organizations.join(", "));
    }
    if let Some(scope) = &config.report.default_scope {
        println!("Default scope: {}", scope);
    }
    Ok(())
}
