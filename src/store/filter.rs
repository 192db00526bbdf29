//! Boolean filters over identity records
//!
//! Filters are conjunctions of conditions; both store backends evaluate them
//! with [`IdentityFilter::matches`].

use std::collections::HashSet;

use crate::models::{Identity, ProfileField, RepositoryRef};

/// A field of an identity a condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Login,
    Email,
    Profile(ProfileField),
}

impl Field {
    fn value<'a>(&self, identity: &'a Identity) -> Option<&'a str> {
        match self {
            Field::Login => Some(identity.login()).filter(|v| !v.is_empty()),
            Field::Email => Some(identity.email()).filter(|v| !v.is_empty()),
            Field::Profile(field) => identity.profile.get(*field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals(Field, String),
    NotEquals(Field, String),
    NotEmpty(Field),
    Empty(Field),
    /// Has a membership in at least one of the repositories
    MemberOfAny(HashSet<RepositoryRef>),
    /// At least one of the nested conditions holds
    Any(Vec<Condition>),
}

impl Condition {
    pub fn matches(&self, identity: &Identity) -> bool {
        match self {
            Condition::Equals(field, literal) => field.value(identity) == Some(literal.as_str()),
            Condition::NotEquals(field, literal) => field.value(identity) != Some(literal.as_str()),
            Condition::NotEmpty(field) => field.value(identity).is_some(),
            Condition::Empty(field) => field.value(identity).is_none(),
            Condition::MemberOfAny(repositories) => identity.memberships.intersects(repositories),
            Condition::Any(conditions) => conditions.iter().any(|c| c.matches(identity)),
        }
    }
}

/// Conjunction of [`Condition`]s. The empty filter selects every identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFilter {
    conditions: Vec<Condition>,
}

impl IdentityFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn login(login: impl Into<String>) -> Self {
        Self::all().equals(Field::Login, login)
    }

    pub fn equals(self, field: Field, literal: impl Into<String>) -> Self {
        self.with(Condition::Equals(field, literal.into()))
    }

    pub fn not_equals(self, field: Field, literal: impl Into<String>) -> Self {
        self.with(Condition::NotEquals(field, literal.into()))
    }

    pub fn not_empty(self, field: Field) -> Self {
        self.with(Condition::NotEmpty(field))
    }

    pub fn member_of_any(self, repositories: impl IntoIterator<Item = RepositoryRef>) -> Self {
        self.with(Condition::MemberOfAny(repositories.into_iter().collect()))
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        self.conditions.iter().all(|c| c.matches(identity))
    }
}
