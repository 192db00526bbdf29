//! In-memory identity pool keyed by (login, email)

use std::collections::HashMap;

use super::linker;
use crate::models::{AuthorKey, Identity, ProfileField};

/// A snapshot of identities, unique by key, that the linker mutates in place.
#[derive(Debug, Clone, Default)]
pub struct IdentityPool {
    identities: Vec<Identity>,
    index: HashMap<AuthorKey, usize>,
}

impl IdentityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity. When the key is already present the records are
    /// merged: empty fields are filled, memberships and committer flags are
    /// unioned. Returns true if the key was new.
    pub fn insert(&mut self, identity: Identity) -> bool {
        match self.index.get(&identity.key) {
            Some(&i) => {
                let existing = &mut self.identities[i];
                for field in ProfileField::ALL {
                    if let Some(value) = identity.profile.get(field) {
                        existing.profile.fill(field, value);
                    }
                }
                for (repository, committer) in identity.memberships.iter() {
                    if committer {
                        existing.memberships.mark_committer(repository);
                    } else {
                        existing.memberships.insert(repository.clone());
                    }
                }
                false
            }
            None => {
                self.index
                    .insert(identity.key.clone(), self.identities.len());
                self.identities.push(identity);
                true
            }
        }
    }

    pub fn get(&self, key: &AuthorKey) -> Option<&Identity> {
        self.index.get(key).map(|&i| &self.identities[i])
    }

    pub fn contains(&self, key: &AuthorKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    pub fn as_slice(&self) -> &[Identity] {
        &self.identities
    }

    pub fn into_identities(self) -> Vec<Identity> {
        self.identities
    }

    /// Run the fixed-point linker over the pool.
    ///
    /// Returns the keys of the identities whose state changed; read the new
    /// values back with [`IdentityPool::get`].
    pub fn link_all(&mut self) -> Vec<AuthorKey> {
        linker::link_all(&mut self.identities)
    }
}

impl FromIterator<Identity> for IdentityPool {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        let mut pool = IdentityPool::new();
        for identity in iter {
            pool.insert(identity);
        }
        pool
    }
}
