//! ghstats - Contributor statistics across git history and GitHub
//!
//! Commit authors are recorded as raw (login, email) identities, enriched
//! from GitHub, linked across aliases and finally clustered into one
//! contributor per person when commit activity is aggregated.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod identity;
pub mod import;
pub mod models;
pub mod scope;
pub mod store;

pub use aggregate::aggregate;
pub use error::{GhStatsError, Result};
pub use identity::{link_all, IdentityPool};
pub use import::{ActivityReport, BatchReport, Importer};
pub use models::{AuthorKey, ClusterSummary, CommitActivity, Identity, ProfileView, RepositoryRef};
pub use scope::RepositoryScope;
