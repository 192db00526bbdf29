//! Identity resolution
//!
//! Matches raw author records against profiled ones, propagates profile data
//! and committer status until nothing changes, and resolves identities
//! against a repository scope for aggregation.
//!
//! # Example
//!
//! ```
//! use ghstats::identity::IdentityPool;
//! use ghstats::models::Identity;
//!
//! let mut pool: IdentityPool = vec![
//!     Identity::new("a1", "a1@x.com"),
//!     Identity::new("a2", "a1@x.com").with_avatar("https://avatars/a2"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let changed = pool.link_all();
//! assert_eq!(changed.len(), 1);
//! ```

mod linker;
pub mod matching;
mod pool;

pub use linker::link_all;
pub use matching::{apply_link, find_matches, is_match, matching_rule, MatchRule};
pub use pool::IdentityPool;

use std::collections::{HashMap, HashSet};

use crate::models::{AuthorKey, Identity, ProfileField, ProfileView, RepositoryRef};

/// True iff `identity` is flagged committer on at least one repository in `scope`.
pub fn is_committer_in_scope(identity: &Identity, scope: &HashSet<RepositoryRef>) -> bool {
    identity.memberships.is_committer_in(scope)
}

/// Resolve identities contributing to `scope` into the views aggregation needs.
///
/// Identities with no membership inside the scope are left out.
pub fn profile_views<'a>(
    identities: impl IntoIterator<Item = &'a Identity>,
    scope: &HashSet<RepositoryRef>,
) -> HashMap<AuthorKey, ProfileView> {
    identities
        .into_iter()
        .filter(|identity| identity.memberships.intersects(scope))
        .map(|identity| {
            let view = ProfileView {
                name: identity.profile.get(ProfileField::Name).map(str::to_string),
                avatar: identity.profile.get(ProfileField::Avatar).map(str::to_string),
                company: identity
                    .profile
                    .get(ProfileField::Company)
                    .map(str::to_string),
                committer: is_committer_in_scope(identity, scope),
            };
            (identity.key.clone(), view)
        })
        .collect()
}
