//! Commit history extraction using libgit2
//!
//! Clones are expected under `<clones_dir>/<organization>/<repository>`.

use chrono::{DateTime, TimeZone, Utc};
use git2::{Repository, Sort};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{HistoryError, HistoryResult, HistoryScanner};
use crate::models::{AuthorKey, CommitActivity, RepositoryRef};

/// History scanner over local clones.
#[derive(Debug, Clone)]
pub struct GitHistory {
    clones_dir: PathBuf,
}

impl GitHistory {
    pub fn new(clones_dir: impl Into<PathBuf>) -> Self {
        Self {
            clones_dir: clones_dir.into(),
        }
    }

    pub fn clones_dir(&self) -> &Path {
        &self.clones_dir
    }

    /// Where the clone of `repository` is expected.
    pub fn clone_path(&self, repository: &RepositoryRef) -> PathBuf {
        self.clones_dir
            .join(&repository.organization)
            .join(&repository.repository)
    }

    fn open(&self, repository: &RepositoryRef) -> HistoryResult<Repository> {
        let path = self.clone_path(repository);
        if !path.exists() {
            return Err(HistoryError::MissingClone {
                repository: repository.clone(),
                path,
            });
        }
        let repo = Repository::open(&path).map_err(|source| HistoryError::Git {
            repository: repository.clone(),
            source,
        })?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(repo)
    }

    /// Visit the author of every commit reachable from HEAD, newest first.
    fn walk(
        &self,
        repository: &RepositoryRef,
        since: Option<DateTime<Utc>>,
        mut visit: impl FnMut(AuthorKey),
    ) -> HistoryResult<()> {
        let git_err = |source: git2::Error| HistoryError::Git {
            repository: repository.clone(),
            source,
        };

        let repo = self.open(repository)?;
        // Freshly initialised clone without commits
        if repo.is_empty().map_err(git_err)? {
            return Ok(());
        }
        let mut revwalk = repo.revwalk().map_err(git_err)?;
        revwalk.set_sorting(Sort::TIME).map_err(git_err)?;
        revwalk.push_head().map_err(git_err)?;

        for oid_result in revwalk {
            let oid = oid_result.map_err(git_err)?;
            let commit = repo.find_commit(oid).map_err(git_err)?;

            if let Some(since_ts) = since {
                let commit_dt = Utc.timestamp_opt(commit.time().seconds(), 0).single();
                if commit_dt.is_some_and(|dt| dt < since_ts) {
                    continue;
                }
            }

            let author = commit.author();
            visit(AuthorKey::new(
                String::from_utf8_lossy(author.name_bytes()),
                String::from_utf8_lossy(author.email_bytes()),
            ));
        }

        Ok(())
    }
}

impl HistoryScanner for GitHistory {
    fn authors(&self, repository: &RepositoryRef) -> HistoryResult<Vec<AuthorKey>> {
        let mut seen: HashSet<AuthorKey> = HashSet::new();
        let mut authors = Vec::new();
        self.walk(repository, None, |author| {
            if seen.insert(author.clone()) {
                authors.push(author);
            }
        })?;
        debug!("Found {} author(s) in {}", authors.len(), repository);
        Ok(authors)
    }

    fn commit_activity(
        &self,
        repository: &RepositoryRef,
        since: Option<DateTime<Utc>>,
    ) -> HistoryResult<Vec<CommitActivity>> {
        let mut position: HashMap<AuthorKey, usize> = HashMap::new();
        let mut activity: Vec<CommitActivity> = Vec::new();
        self.walk(repository, since, |author| {
            let next = activity.len();
            let i = *position.entry(author.clone()).or_insert(next);
            if i == next {
                activity.push(CommitActivity::new(author, 1));
            } else {
                activity[i].count += 1;
            }
        })?;
        Ok(activity)
    }
}
