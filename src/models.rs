//! Core data models for ghstats
//!
//! These models describe contributor identities as observed in git history
//! and on GitHub, the repositories they contributed to, and the commit
//! activity rows and cluster summaries produced by aggregation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Natural key of a raw author record: the login (or git author name) plus email.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuthorKey {
    pub login: String,
    pub email: String,
}

impl AuthorKey {
    pub fn new(login: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for AuthorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.login, self.email)
    }
}

/// A GitHub repository, identified by organization and repository name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub organization: String,
    pub repository: String,
}

impl RepositoryRef {
    pub fn new(organization: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            repository: repository.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

/// Enrichment fields carried by an identity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Avatar,
    Company,
    ProfileUrl,
}

impl ProfileField {
    pub const ALL: [ProfileField; 4] = [
        ProfileField::Name,
        ProfileField::Avatar,
        ProfileField::Company,
        ProfileField::ProfileUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Avatar => "avatar",
            ProfileField::Company => "company",
            ProfileField::ProfileUrl => "profile_url",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional enrichment data for an identity.
///
/// An empty string is treated exactly like an unset field, so a profile read
/// back from storage with `""` values is still considered empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl Profile {
    /// Value of a field, `None` when unset or empty.
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.slot(field).as_deref().filter(|v| !v.is_empty())
    }

    /// True when no enrichment field carries a value.
    pub fn is_empty(&self) -> bool {
        ProfileField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Set `field` to `value` only if the field is currently empty.
    ///
    /// Returns whether the profile changed. Empty values are ignored.
    pub fn fill(&mut self, field: ProfileField, value: &str) -> bool {
        if value.is_empty() || self.get(field).is_some() {
            return false;
        }
        *self.slot_mut(field) = Some(value.to_string());
        true
    }

    /// Set `field` to `value`, replacing any current value.
    ///
    /// Empty values never clear a field. Returns whether the profile changed.
    pub fn replace(&mut self, field: ProfileField, value: &str) -> bool {
        if value.is_empty() || self.get(field) == Some(value) {
            return false;
        }
        *self.slot_mut(field) = Some(value.to_string());
        true
    }

    fn slot(&self, field: ProfileField) -> &Option<String> {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Avatar => &self.avatar,
            ProfileField::Company => &self.company,
            ProfileField::ProfileUrl => &self.profile_url,
        }
    }

    fn slot_mut(&mut self, field: ProfileField) -> &mut Option<String> {
        match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Avatar => &mut self.avatar,
            ProfileField::Company => &mut self.company,
            ProfileField::ProfileUrl => &mut self.profile_url,
        }
    }
}

/// One repository an identity contributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub repository: RepositoryRef,
    #[serde(default)]
    pub committer: bool,
}

/// Repository membership index of a single identity.
///
/// Each repository carries a committer flag. Flags only ever go from `false`
/// to `true`; memberships are added but never removed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Membership>", into = "Vec<Membership>")]
pub struct Memberships(BTreeMap<RepositoryRef, bool>);

impl Memberships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contribution to `repository`. Returns true if it was new.
    pub fn insert(&mut self, repository: RepositoryRef) -> bool {
        if self.0.contains_key(&repository) {
            return false;
        }
        self.0.insert(repository, false);
        true
    }

    /// Flag the identity as committer of `repository`, adding the membership
    /// if missing. Returns whether anything changed.
    pub fn mark_committer(&mut self, repository: &RepositoryRef) -> bool {
        match self.0.get_mut(repository) {
            Some(flag) if *flag => false,
            Some(flag) => {
                *flag = true;
                true
            }
            None => {
                self.0.insert(repository.clone(), true);
                true
            }
        }
    }

    pub fn contains(&self, repository: &RepositoryRef) -> bool {
        self.0.contains_key(repository)
    }

    pub fn is_committer(&self, repository: &RepositoryRef) -> bool {
        self.0.get(repository).copied().unwrap_or(false)
    }

    /// True iff a membership inside `scope` carries the committer flag.
    pub fn is_committer_in(&self, scope: &HashSet<RepositoryRef>) -> bool {
        self.0
            .iter()
            .any(|(repository, committer)| *committer && scope.contains(repository))
    }

    /// True iff at least one membership is inside `scope`.
    pub fn intersects(&self, scope: &HashSet<RepositoryRef>) -> bool {
        self.0.keys().any(|repository| scope.contains(repository))
    }

    /// OR the committer flags of `source` into the repositories this index
    /// already holds. Repositories only present in `source` are not added.
    pub fn absorb_committer_flags(&mut self, source: &Memberships) -> bool {
        let mut changed = false;
        for (repository, flag) in self.0.iter_mut() {
            if !*flag && source.is_committer(repository) {
                *flag = true;
                changed = true;
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RepositoryRef, bool)> {
        self.0.iter().map(|(r, c)| (r, *c))
    }

    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryRef> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Membership>> for Memberships {
    fn from(entries: Vec<Membership>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            let flag = map.entry(entry.repository).or_insert(false);
            *flag |= entry.committer;
        }
        Self(map)
    }
}

impl From<Memberships> for Vec<Membership> {
    fn from(memberships: Memberships) -> Self {
        memberships
            .0
            .into_iter()
            .map(|(repository, committer)| Membership {
                repository,
                committer,
            })
            .collect()
    }
}

/// A contributor record keyed by login and email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: AuthorKey,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub memberships: Memberships,
}

impl Identity {
    pub fn new(login: impl Into<String>, email: impl Into<String>) -> Self {
        Self::from_key(AuthorKey::new(login, email))
    }

    pub fn from_key(key: AuthorKey) -> Self {
        Self {
            key,
            profile: Profile::default(),
            memberships: Memberships::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.profile.name = Some(name.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.profile.avatar = Some(avatar.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.profile.company = Some(company.into());
        self
    }

    pub fn with_membership(mut self, repository: RepositoryRef, committer: bool) -> Self {
        if committer {
            self.memberships.mark_committer(&repository);
        } else {
            self.memberships.insert(repository);
        }
        self
    }

    pub fn login(&self) -> &str {
        &self.key.login
    }

    pub fn email(&self) -> &str {
        &self.key.email
    }

    pub fn name(&self) -> Option<&str> {
        self.profile.get(ProfileField::Name)
    }

    /// A "full" record has at least one enrichment field set and may act as
    /// a propagation source when linking.
    pub fn is_full(&self) -> bool {
        !self.profile.is_empty()
    }

    /// Import profile data fetched from the platform.
    ///
    /// Without `overwrite` only empty fields are filled. With `overwrite`,
    /// non-empty incoming values replace existing ones. Returns whether the
    /// identity changed.
    pub fn apply_profile(&mut self, profile: &Profile, overwrite: bool) -> bool {
        let mut changed = false;
        for field in ProfileField::ALL {
            if let Some(value) = profile.get(field) {
                changed |= if overwrite {
                    self.profile.replace(field, value)
                } else {
                    self.profile.fill(field, value)
                };
            }
        }
        changed
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

/// Stored repository definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub repository: RepositoryRef,
    pub git_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Commit count for one author as seen by one history source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    pub author: AuthorKey,
    pub count: u64,
}

impl CommitActivity {
    pub fn new(author: AuthorKey, count: u64) -> Self {
        Self { author, count }
    }
}

/// Author data resolved against a repository scope, as consumed by aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub committer: bool,
}

impl ProfileView {
    /// Display name, falling back to the key's login when no name is known.
    pub fn resolved_name<'a>(&'a self, key: &'a AuthorKey) -> &'a str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &key.login,
        }
    }
}

/// One reconciled contributor in an aggregation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub display_name: String,
    pub count: u64,
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub committer: bool,
    pub members: Vec<AuthorKey>,
}
