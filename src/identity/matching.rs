//! Matching engine: decides which identities are aliases of a profiled one
//!
//! A candidate is linked to a reference when any [`MatchRule`] holds. All
//! comparisons are exact, case-sensitive string equality. Empty reference
//! fields never match anything and an identity never matches itself.

use std::collections::HashMap;

use crate::models::{Identity, ProfileField};

/// Aliasing patterns that tie a candidate to a reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    /// Same login, different email (one person, two addresses).
    SameLoginOtherEmail,
    /// Candidate login equals the reference's full name (git name used as id).
    LoginIsReferenceName,
    /// Same full name, different login and email.
    SameNameOtherLoginAndEmail,
    /// Same email, different login.
    SameEmailOtherLogin,
    /// Candidate full name equals the reference login, different login.
    NameIsReferenceLogin,
}

impl MatchRule {
    pub const ALL: [MatchRule; 5] = [
        MatchRule::SameLoginOtherEmail,
        MatchRule::LoginIsReferenceName,
        MatchRule::SameNameOtherLoginAndEmail,
        MatchRule::SameEmailOtherLogin,
        MatchRule::NameIsReferenceLogin,
    ];

    /// Evaluate this rule for a (reference, candidate) pair.
    pub fn matches(self, reference: &Identity, candidate: &Identity) -> bool {
        let ref_login = reference.login();
        let ref_email = reference.email();
        match self {
            MatchRule::SameLoginOtherEmail => {
                !ref_login.is_empty()
                    && candidate.login() == ref_login
                    && candidate.email() != ref_email
            }
            MatchRule::LoginIsReferenceName => reference
                .name()
                .is_some_and(|name| candidate.login() == name),
            MatchRule::SameNameOtherLoginAndEmail => reference.name().is_some_and(|name| {
                candidate.name() == Some(name)
                    && candidate.login() != ref_login
                    && candidate.email() != ref_email
            }),
            MatchRule::SameEmailOtherLogin => {
                !ref_email.is_empty()
                    && candidate.email() == ref_email
                    && candidate.login() != ref_login
            }
            MatchRule::NameIsReferenceLogin => {
                !ref_login.is_empty()
                    && candidate.name() == Some(ref_login)
                    && candidate.login() != ref_login
            }
        }
    }
}

/// First rule linking `candidate` to `reference`, if any.
///
/// Returns `None` when the reference carries no enrichment data, since an
/// empty record has nothing to propagate.
pub fn matching_rule(reference: &Identity, candidate: &Identity) -> Option<MatchRule> {
    if !reference.is_full() || reference.key == candidate.key {
        return None;
    }
    MatchRule::ALL
        .into_iter()
        .find(|rule| rule.matches(reference, candidate))
}

pub fn is_match(reference: &Identity, candidate: &Identity) -> bool {
    matching_rule(reference, candidate).is_some()
}

/// All identities in `pool` that refer to the same person as `reference`.
pub fn find_matches<'a>(reference: &Identity, pool: &'a [Identity]) -> Vec<&'a Identity> {
    pool.iter()
        .filter(|candidate| is_match(reference, candidate))
        .collect()
}

/// Copy enrichment data and committer flags from `reference` into `candidate`.
///
/// Fields are only written when empty on the candidate, and committer flags
/// are only raised (for repositories the candidate already belongs to).
/// Returns whether the candidate changed.
pub fn apply_link(reference: &Identity, candidate: &mut Identity) -> bool {
    let mut changed = false;
    for field in ProfileField::ALL {
        if let Some(value) = reference.profile.get(field) {
            changed |= candidate.profile.fill(field, value);
        }
    }
    changed |= candidate
        .memberships
        .absorb_committer_flags(&reference.memberships);
    changed
}

/// Lookup tables over a snapshot of the pool, so a reference only has to be
/// checked against identities sharing one of the compared fields.
pub(crate) struct CandidateIndex<'a> {
    pool: &'a [Identity],
    by_login: HashMap<&'a str, Vec<usize>>,
    by_email: HashMap<&'a str, Vec<usize>>,
    by_name: HashMap<&'a str, Vec<usize>>,
}

impl<'a> CandidateIndex<'a> {
    pub(crate) fn new(pool: &'a [Identity]) -> Self {
        let mut by_login: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_email: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, identity) in pool.iter().enumerate() {
            by_login.entry(identity.login()).or_default().push(i);
            by_email.entry(identity.email()).or_default().push(i);
            if let Some(name) = identity.name() {
                by_name.entry(name).or_default().push(i);
            }
        }
        Self {
            pool,
            by_login,
            by_email,
            by_name,
        }
    }

    /// Indices of the identities matching `reference`, ascending.
    pub(crate) fn matches(&self, reference: &Identity) -> Vec<usize> {
        if !reference.is_full() {
            return Vec::new();
        }
        let lookup = |table: &HashMap<&str, Vec<usize>>, value: &str| -> Vec<usize> {
            if value.is_empty() {
                return Vec::new();
            }
            table.get(value).cloned().unwrap_or_default()
        };
        let name = reference.name().unwrap_or("");

        let mut hits: Vec<usize> = Vec::new();
        hits.extend(lookup(&self.by_login, reference.login()));
        hits.extend(lookup(&self.by_login, name));
        hits.extend(lookup(&self.by_name, name));
        hits.extend(lookup(&self.by_email, reference.email()));
        hits.extend(lookup(&self.by_name, reference.login()));
        hits.sort_unstable();
        hits.dedup();
        hits.retain(|&i| is_match(reference, &self.pool[i]));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryRef;

    fn full(login: &str, email: &str) -> Identity {
        Identity::new(login, email).with_avatar(format!("https://avatars/{login}"))
    }

    #[test]
    fn test_rule_same_login_other_email() {
        let reference = full("vmassol", "vincent@massol.net");
        let candidate = Identity::new("vmassol", "vincent@xwiki.com");
        assert_eq!(
            matching_rule(&reference, &candidate),
            Some(MatchRule::SameLoginOtherEmail)
        );
    }

    #[test]
    fn test_rule_login_is_reference_name() {
        let reference = full("vmassol", "vincent@massol.net").with_name("Vincent Massol");
        let candidate = Identity::new("Vincent Massol", "vincent@xwiki.com");
        assert_eq!(
            matching_rule(&reference, &candidate),
            Some(MatchRule::LoginIsReferenceName)
        );
    }

    #[test]
    fn test_rule_same_name_requires_other_login_and_email() {
        let reference = full("tmortagne", "thomas@xwiki.com").with_name("Thomas Mortagne");
        let other = Identity::new("thomas", "tm@gmail.com").with_name("Thomas Mortagne");
        assert_eq!(
            matching_rule(&reference, &other),
            Some(MatchRule::SameNameOtherLoginAndEmail)
        );

        // Same email: rule C is excluded but rule D still applies
        let same_email = Identity::new("thomas", "thomas@xwiki.com").with_name("Thomas Mortagne");
        assert_eq!(
            matching_rule(&reference, &same_email),
            Some(MatchRule::SameEmailOtherLogin)
        );
    }

    #[test]
    fn test_rule_same_email_other_login() {
        let reference = full("a2", "a1@x.com");
        let candidate = Identity::new("a1", "a1@x.com");
        assert_eq!(
            matching_rule(&reference, &candidate),
            Some(MatchRule::SameEmailOtherLogin)
        );
    }

    #[test]
    fn test_rule_name_is_reference_login() {
        // Someone used their GitHub login as git user.name elsewhere
        let reference = full("cjdelisle", "cjd@xwiki.com");
        let candidate = Identity::new("Caleb", "caleb@home.org").with_name("cjdelisle");
        assert_eq!(
            matching_rule(&reference, &candidate),
            Some(MatchRule::NameIsReferenceLogin)
        );
        assert!(MatchRule::NameIsReferenceLogin.matches(&reference, &candidate));

        // No email exclusion for this rule
        let same_email = Identity::new("Caleb", "cjd@xwiki.com").with_name("cjdelisle");
        assert!(MatchRule::NameIsReferenceLogin.matches(&reference, &same_email));

        // The candidate login must differ
        let same_login = Identity::new("cjdelisle", "other@x.org").with_name("cjdelisle");
        assert!(!MatchRule::NameIsReferenceLogin.matches(&reference, &same_login));
    }

    #[test]
    fn test_empty_reference_never_matches() {
        let reference = Identity::new("a1", "a1@x.com");
        let candidate = Identity::new("a1", "other@x.com");
        assert!(!is_match(&reference, &candidate));
    }

    #[test]
    fn test_identity_never_matches_itself() {
        let reference = full("gdelhumeau", "g@x.com").with_name("gdelhumeau");
        assert!(!is_match(&reference, &reference.clone()));
    }

    #[test]
    fn test_empty_fields_do_not_match_each_other() {
        let reference = Identity::new("", "").with_company("XWiki SAS");
        let candidate = Identity::new("", "");
        let other = Identity::new("someone", "");
        assert!(!is_match(&reference, &candidate));
        assert!(!is_match(&reference, &other));
    }

    #[test]
    fn test_find_matches_and_index_agree() {
        let pool = vec![
            full("a2", "a1@x.com").with_name("a1"),
            Identity::new("a1", "a1@x.com"),
            Identity::new("a1", "other@x.com"),
            Identity::new("zz", "zz@x.com").with_name("a1"),
            Identity::new("unrelated", "u@x.com"),
        ];
        let index = CandidateIndex::new(&pool);
        let expected: Vec<usize> = find_matches(&pool[0], &pool)
            .into_iter()
            .map(|m| pool.iter().position(|p| p.key == m.key).unwrap())
            .collect();
        assert_eq!(index.matches(&pool[0]), expected);
        assert_eq!(expected, vec![1, 2, 3]);
    }

    #[test]
    fn test_apply_link_fills_only_empty_fields() {
        let reference = full("vmassol", "v@x.com")
            .with_name("Vincent Massol")
            .with_company("XWiki SAS");
        let mut candidate = Identity::new("vmassol", "v@y.com").with_company("Other");

        assert!(apply_link(&reference, &mut candidate));
        assert_eq!(candidate.name(), Some("Vincent Massol"));
        assert_eq!(candidate.profile.company.as_deref(), Some("Other"));
        assert_eq!(
            candidate.profile.avatar.as_deref(),
            Some("https://avatars/vmassol")
        );
        assert!(!apply_link(&reference, &mut candidate));
    }

    #[test]
    fn test_apply_link_raises_committer_flags_only() {
        let platform = RepositoryRef::new("xwiki", "xwiki-platform");
        let commons = RepositoryRef::new("xwiki", "xwiki-commons");
        let reference = full("vmassol", "v@x.com")
            .with_membership(platform.clone(), true)
            .with_membership(commons.clone(), false);
        let mut candidate = Identity::new("vmassol", "v@y.com")
            .with_avatar("mine.png")
            .with_membership(platform.clone(), false)
            .with_membership(commons.clone(), true);

        assert!(apply_link(&reference, &mut candidate));
        assert!(candidate.memberships.is_committer(&platform));
        // Never reset to false
        assert!(candidate.memberships.is_committer(&commons));
    }
}
