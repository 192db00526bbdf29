//! GitHub platform access
//!
//! The import layer talks to the [`PlatformClient`] trait; [`GitHubClient`]
//! implements it over the GitHub REST API. Clients do not retry: a failed or
//! rate limited call is reported to the caller, which records it and moves on.

mod client;

pub use client::{GitHubClient, DEFAULT_API_URL};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Identity, Profile, RepositoryRecord, RepositoryRef};

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("GitHub API rate limit exhausted until {reset}")]
    RateLimited { reset: DateTime<Utc> },

    #[error("Failed to parse GitHub response: {0}")]
    Parse(String),

    #[error("Missing GitHub token: set GITHUB_TOKEN or [github] token in the config")]
    MissingToken,
}

pub type GitHubResult<T> = std::result::Result<T, GitHubError>;

/// A GitHub user account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlatformUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl PlatformUser {
    /// Profile data imported into identities.
    ///
    /// The profile URL is left unset: it is never populated from the platform.
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            avatar: self.avatar_url.clone(),
            company: self.company.clone(),
            profile_url: None,
        }
    }

    /// Public email, or `None` when the user hides it.
    pub fn public_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

/// A repository listed for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    pub clone_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl RemoteRepository {
    pub fn into_record(self, organization: &str) -> RepositoryRecord {
        RepositoryRecord {
            repository: RepositoryRef::new(organization, self.name),
            git_url: self.clone_url,
            html_url: self.html_url,
        }
    }
}

/// Core API quota of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: DateTime<Utc>,
}

/// Which user attribute a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Login,
    Email,
    FullName,
}

impl SearchField {
    /// Value of the `in:` search qualifier.
    pub fn qualifier(&self) -> &'static str {
        match self {
            SearchField::Login => "login",
            SearchField::Email => "email",
            SearchField::FullName => "fullname",
        }
    }
}

pub trait PlatformClient: Send + Sync {
    /// Full details of the user with this exact login, `None` if unknown.
    fn find_user_by_login(&self, login: &str) -> GitHubResult<Option<PlatformUser>>;

    /// Users whose `field` matches `term`. May return zero, one or many.
    fn search_users(&self, term: &str, field: SearchField) -> GitHubResult<Vec<PlatformUser>>;

    fn collaborators(&self, repository: &RepositoryRef) -> GitHubResult<Vec<PlatformUser>>;

    fn organization_repositories(&self, organization: &str) -> GitHubResult<Vec<RemoteRepository>>;

    fn rate_limit(&self) -> GitHubResult<RateLimit>;
}

/// Wrap a search term in double quotes unless it already is.
pub fn quote_term(term: &str) -> String {
    let mut quoted = String::with_capacity(term.len() + 2);
    if !term.starts_with('"') {
        quoted.push('"');
    }
    quoted.push_str(term);
    if !term.ends_with('"') {
        quoted.push('"');
    }
    quoted
}

/// Find the platform account behind a raw author record.
///
/// Searches by login, then by email, then for a full name equal to the
/// login (git names are often used as ids). A step is only accepted when it
/// returns exactly one user; otherwise the next step runs. `Ok(None)` means
/// the lookup was inconclusive.
pub fn locate_user(
    client: &dyn PlatformClient,
    identity: &Identity,
) -> GitHubResult<Option<PlatformUser>> {
    let attempts = [
        (SearchField::Login, identity.login()),
        (SearchField::Email, identity.email()),
        (SearchField::FullName, identity.login()),
    ];

    for (field, term) in attempts {
        if term.is_empty() {
            continue;
        }
        let mut hits = client.search_users(&quote_term(term), field)?;
        if hits.len() != 1 {
            debug!(
                "Search for {} in {} returned {} users",
                term,
                field.qualifier(),
                hits.len()
            );
            continue;
        }
        let hit = hits.remove(0);
        // Search results only carry the login and avatar
        return Ok(Some(client.find_user_by_login(&hit.login)?.unwrap_or(hit)));
    }

    Ok(None)
}
