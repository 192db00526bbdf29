//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use ghstats::git::{HistoryError, HistoryResult, HistoryScanner};
use ghstats::github::{
    quote_term, GitHubError, GitHubResult, PlatformClient, PlatformUser, RateLimit,
    RemoteRepository, SearchField,
};
use ghstats::models::{AuthorKey, CommitActivity, RepositoryRef};

pub fn repo(organization: &str, name: &str) -> RepositoryRef {
    RepositoryRef::new(organization, name)
}

pub fn user(login: &str, name: &str, avatar: &str) -> PlatformUser {
    PlatformUser {
        login: login.to_string(),
        name: Some(name.to_string()),
        avatar_url: Some(avatar.to_string()),
        ..Default::default()
    }
}

/// Scripted platform: users by login, search results by (qualifier, term),
/// collaborators and organization listings.
#[derive(Default)]
pub struct FakePlatform {
    pub users: HashMap<String, PlatformUser>,
    pub searches: HashMap<(&'static str, String), Vec<String>>,
    pub collaborators: HashMap<RepositoryRef, Vec<String>>,
    pub organizations: HashMap<String, Vec<RemoteRepository>>,
    /// Search terms that fail as if the quota ran out
    pub rate_limited_terms: Vec<String>,
}

impl FakePlatform {
    pub fn with_user(mut self, user: PlatformUser) -> Self {
        self.users.insert(user.login.clone(), user);
        self
    }

    /// `term` searched in `field` returns the users with these logins.
    pub fn with_search(mut self, field: SearchField, term: &str, logins: &[&str]) -> Self {
        self.searches.insert(
            (field.qualifier(), quote_term(term)),
            logins.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn with_collaborators(mut self, repository: RepositoryRef, logins: &[&str]) -> Self {
        self.collaborators
            .insert(repository, logins.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_organization(mut self, organization: &str, names: &[&str]) -> Self {
        let listed = names
            .iter()
            .map(|name| RemoteRepository {
                name: name.to_string(),
                clone_url: format!("https://github.com/{}/{}.git", organization, name),
                html_url: Some(format!("https://github.com/{}/{}", organization, name)),
                archived: false,
            })
            .collect();
        self.organizations.insert(organization.to_string(), listed);
        self
    }

    pub fn rate_limited_on(mut self, term: &str) -> Self {
        self.rate_limited_terms.push(quote_term(term));
        self
    }

    /// Collaborator listings only carry the login and the avatar.
    fn listed(&self, login: &str) -> PlatformUser {
        PlatformUser {
            login: login.to_string(),
            avatar_url: self.users.get(login).and_then(|u| u.avatar_url.clone()),
            ..Default::default()
        }
    }
}

impl PlatformClient for FakePlatform {
    fn find_user_by_login(&self, login: &str) -> GitHubResult<Option<PlatformUser>> {
        Ok(self.users.get(login).cloned())
    }

    fn search_users(&self, term: &str, field: SearchField) -> GitHubResult<Vec<PlatformUser>> {
        if self.rate_limited_terms.iter().any(|t| t == term) {
            return Err(GitHubError::RateLimited { reset: Utc::now() });
        }
        Ok(self
            .searches
            .get(&(field.qualifier(), term.to_string()))
            .map(|logins| {
                logins
                    .iter()
                    .map(|login| PlatformUser {
                        login: login.clone(),
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn collaborators(&self, repository: &RepositoryRef) -> GitHubResult<Vec<PlatformUser>> {
        Ok(self
            .collaborators
            .get(repository)
            .map(|logins| logins.iter().map(|l| self.listed(l)).collect())
            .unwrap_or_default())
    }

    fn organization_repositories(&self, organization: &str) -> GitHubResult<Vec<RemoteRepository>> {
        self.organizations
            .get(organization)
            .cloned()
            .ok_or_else(|| GitHubError::Api {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    fn rate_limit(&self) -> GitHubResult<RateLimit> {
        Ok(RateLimit {
            limit: 5000,
            remaining: 5000,
            reset: Utc::now(),
        })
    }
}

/// Commits per repository as (author name, author email, commit time).
#[derive(Default)]
pub struct FakeHistory {
    pub commits: HashMap<RepositoryRef, Vec<(AuthorKey, DateTime<Utc>)>>,
}

impl FakeHistory {
    pub fn with_commits(
        mut self,
        repository: RepositoryRef,
        commits: &[(&str, &str, DateTime<Utc>)],
    ) -> Self {
        self.commits.entry(repository).or_default().extend(
            commits
                .iter()
                .map(|(name, email, at)| (AuthorKey::new(*name, *email), *at)),
        );
        self
    }

    fn commits_of(
        &self,
        repository: &RepositoryRef,
    ) -> HistoryResult<&[(AuthorKey, DateTime<Utc>)]> {
        self.commits
            .get(repository)
            .map(Vec::as_slice)
            .ok_or_else(|| HistoryError::MissingClone {
                repository: repository.clone(),
                path: format!("/clones/{}", repository).into(),
            })
    }
}

impl HistoryScanner for FakeHistory {
    fn authors(&self, repository: &RepositoryRef) -> HistoryResult<Vec<AuthorKey>> {
        let mut authors: Vec<AuthorKey> = Vec::new();
        for (author, _) in self.commits_of(repository)? {
            if !authors.contains(author) {
                authors.push(author.clone());
            }
        }
        Ok(authors)
    }

    fn commit_activity(
        &self,
        repository: &RepositoryRef,
        since: Option<DateTime<Utc>>,
    ) -> HistoryResult<Vec<CommitActivity>> {
        let mut activity: Vec<CommitActivity> = Vec::new();
        for (author, at) in self.commits_of(repository)? {
            if since.is_some_and(|since| *at < since) {
                continue;
            }
            match activity.iter_mut().find(|row| row.author == *author) {
                Some(row) => row.count += 1,
                None => activity.push(CommitActivity::new(author.clone(), 1)),
            }
        }
        Ok(activity)
    }
}
