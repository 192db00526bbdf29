//! GitHub REST client
//!
//! Uses ureq (sync HTTP), no async runtime needed.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{
    GitHubError, GitHubResult, PlatformClient, PlatformUser, RateLimit, RemoteRepository,
    SearchField,
};
use crate::models::RepositoryRef;

const PER_PAGE: usize = 100;
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("ghstats/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<PlatformUser>,
}

#[derive(Deserialize)]
struct RateLimitResponse {
    rate: RawRate,
}

#[derive(Deserialize)]
struct RawRate {
    limit: u64,
    remaining: u64,
    reset: i64,
}

pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    token: Option<String>,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

fn epoch_to_utc(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_else(Utc::now)
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: make_agent(timeout),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// GET a JSON document. A 404 yields `Ok(None)`.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> GitHubResult<Option<T>> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self
            .agent
            .get(&url)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {}", token));
        }
        for (key, value) in query {
            request = request.query(*key, value);
        }

        debug!("GET {}", url);
        let response = request.call().map_err(|e| GitHubError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        if status == 403 || status == 429 {
            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            if status == 429 || header("x-ratelimit-remaining").as_deref() == Some("0") {
                let reset = header("x-ratelimit-reset")
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(epoch_to_utc)
                    .unwrap_or_else(Utc::now);
                return Err(GitHubError::RateLimited { reset });
            }
        }
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(GitHubError::Api { status, message });
        }

        response
            .into_body()
            .read_json()
            .map(Some)
            .map_err(|e| GitHubError::Parse(e.to_string()))
    }

    /// GET every page of a JSON array resource.
    fn get_paged<T: DeserializeOwned>(&self, path: &str) -> GitHubResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let query = [("per_page", PER_PAGE.to_string()), ("page", page.to_string())];
            let batch: Vec<T> = self.get_json(path, &query)?.ok_or_else(|| GitHubError::Api {
                status: 404,
                message: format!("{} not found", path),
            })?;
            let last = batch.len() < PER_PAGE;
            items.extend(batch);
            if last {
                return Ok(items);
            }
            page += 1;
        }
    }
}

impl PlatformClient for GitHubClient {
    fn find_user_by_login(&self, login: &str) -> GitHubResult<Option<PlatformUser>> {
        self.get_json(&format!("/users/{}", login), &[])
    }

    fn search_users(&self, term: &str, field: SearchField) -> GitHubResult<Vec<PlatformUser>> {
        let q = format!("{} in:{} type:user", term, field.qualifier());
        let response: Option<SearchResponse> =
            self.get_json("/search/users", &[("q", q), ("per_page", PER_PAGE.to_string())])?;
        let response = response.ok_or_else(|| GitHubError::Parse("missing search result".into()))?;
        debug!(
            "User search {} in:{} matched {} account(s)",
            term,
            field.qualifier(),
            response.total_count
        );
        Ok(response.items)
    }

    fn collaborators(&self, repository: &RepositoryRef) -> GitHubResult<Vec<PlatformUser>> {
        // Listing collaborators requires push access to the repository
        if self.token.is_none() {
            return Err(GitHubError::MissingToken);
        }
        self.get_paged(&format!(
            "/repos/{}/{}/collaborators",
            repository.organization, repository.repository
        ))
    }

    fn organization_repositories(&self, organization: &str) -> GitHubResult<Vec<RemoteRepository>> {
        self.get_paged(&format!("/orgs/{}/repos", organization))
    }

    fn rate_limit(&self) -> GitHubResult<RateLimit> {
        let response: Option<RateLimitResponse> = self.get_json("/rate_limit", &[])?;
        let rate = response
            .ok_or_else(|| GitHubError::Parse("missing rate limit document".into()))?
            .rate;
        Ok(RateLimit {
            limit: rate.limit,
            remaining: rate.remaining,
            reset: epoch_to_utc(rate.reset),
        })
    }
}
