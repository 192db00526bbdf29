//! Git history scanning
//!
//! Extracts the (name, email) pairs that authored commits in a repository,
//! and per-author commit counts, from local clones.
//!
//! # Example
//!
//! ```no_run
//! use ghstats::git::{GitHistory, HistoryScanner};
//! use ghstats::models::RepositoryRef;
//!
//! let history = GitHistory::new("/var/cache/ghstats/clones");
//! let repository = RepositoryRef::new("xwiki", "xwiki-commons");
//! for author in history.authors(&repository).unwrap() {
//!     println!("{}", author);
//! }
//! ```

mod history;

pub use history::GitHistory;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{AuthorKey, CommitActivity, RepositoryRef};

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("No local clone of {repository} at {}", .path.display())]
    MissingClone {
        repository: RepositoryRef,
        path: PathBuf,
    },

    #[error("Failed to read history of {repository}: {source}")]
    Git {
        repository: RepositoryRef,
        #[source]
        source: git2::Error,
    },
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Source of commit authorship for a repository.
pub trait HistoryScanner: Send + Sync {
    /// Distinct commit authors, keyed by (name, email), in first-seen order.
    fn authors(&self, repository: &RepositoryRef) -> HistoryResult<Vec<AuthorKey>>;

    /// Commit count per author, optionally restricted to commits at or after `since`.
    fn commit_activity(
        &self,
        repository: &RepositoryRef,
        since: Option<DateTime<Utc>>,
    ) -> HistoryResult<Vec<CommitActivity>>;

    /// Distinct authors across several repositories, in first-seen order.
    fn find_authors(&self, repositories: &[RepositoryRef]) -> HistoryResult<Vec<AuthorKey>> {
        let mut seen = HashSet::new();
        let mut authors = Vec::new();
        for repository in repositories {
            for author in self.authors(repository)? {
                if seen.insert(author.clone()) {
                    authors.push(author);
                }
            }
        }
        Ok(authors)
    }
}
