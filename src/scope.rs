//! Repository scope expressions
//!
//! A scope is a comma separated list of `organization/repository` items,
//! where the repository may be `*` to select every repository of the
//! organization, e.g. `xwiki/*,xwiki-contrib/application-github-statistics`.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{GhStatsError, Result};
use crate::models::RepositoryRef;

const WILDCARD: &str = "*";

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid segment regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScopeItem {
    organization: String,
    /// `None` selects every repository of the organization
    repository: Option<String>,
}

impl ScopeItem {
    fn matches(&self, repository: &RepositoryRef) -> bool {
        self.organization == repository.organization
            && self
                .repository
                .as_ref()
                .map_or(true, |name| *name == repository.repository)
    }
}

/// A parsed set of repository selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryScope {
    items: Vec<ScopeItem>,
}

impl RepositoryScope {
    /// Parse a scope expression. Any malformed item fails the whole call.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: String| GhStatsError::InvalidScope {
            input: input.to_string(),
            reason,
        };

        let mut items = Vec::new();
        for raw in input.split(',') {
            let item = raw.trim();
            if item.is_empty() {
                return Err(invalid("empty item".to_string()));
            }
            let mut parts = item.split('/');
            let (Some(organization), Some(repository), None) =
                (parts.next(), parts.next(), parts.next())
            else {
                return Err(invalid(format!(
                    "[{item}] is not of the form organization/repository"
                )));
            };
            if !segment_pattern().is_match(organization) {
                return Err(invalid(format!("bad organization [{organization}]")));
            }
            let repository = if repository == WILDCARD {
                None
            } else if segment_pattern().is_match(repository) {
                Some(repository.to_string())
            } else {
                return Err(invalid(format!("bad repository [{repository}]")));
            };
            items.push(ScopeItem {
                organization: organization.to_string(),
                repository,
            });
        }

        Ok(Self { items })
    }

    pub fn contains(&self, repository: &RepositoryRef) -> bool {
        self.items.iter().any(|item| item.matches(repository))
    }

    /// The known repositories selected by this scope.
    pub fn resolve<'a>(
        &self,
        known: impl IntoIterator<Item = &'a RepositoryRef>,
    ) -> HashSet<RepositoryRef> {
        known
            .into_iter()
            .filter(|repository| self.contains(repository))
            .cloned()
            .collect()
    }
}

impl fmt::Display for RepositoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .items
            .iter()
            .map(|item| {
                format!(
                    "{}/{}",
                    item.organization,
                    item.repository.as_deref().unwrap_or(WILDCARD)
                )
            })
            .collect();
        f.write_str(&rendered.join(","))
    }
}
