//! In-memory record store

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{IdentityFilter, RecordStore, StoreError, StoreResult};
use crate::models::{AuthorKey, Identity, RepositoryRecord, RepositoryRef};

#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: RwLock<BTreeMap<AuthorKey, Identity>>,
    repositories: RwLock<BTreeMap<RepositoryRef, RepositoryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_identities(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<AuthorKey, Identity>>> {
        self.identities
            .read()
            .map_err(|_| StoreError::Poisoned("identities"))
    }

    fn write_identities(
        &self,
    ) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<AuthorKey, Identity>>> {
        self.identities
            .write()
            .map_err(|_| StoreError::Poisoned("identities"))
    }

    fn read_repositories(
        &self,
    ) -> StoreResult<RwLockReadGuard<'_, BTreeMap<RepositoryRef, RepositoryRecord>>> {
        self.repositories
            .read()
            .map_err(|_| StoreError::Poisoned("repositories"))
    }

    fn write_repositories(
        &self,
    ) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<RepositoryRef, RepositoryRecord>>> {
        self.repositories
            .write()
            .map_err(|_| StoreError::Poisoned("repositories"))
    }
}

impl RecordStore for MemoryStore {
    fn query_identities(&self, filter: &IdentityFilter) -> StoreResult<Vec<Identity>> {
        Ok(self
            .read_identities()?
            .values()
            .filter(|identity| filter.matches(identity))
            .cloned()
            .collect())
    }

    fn get_identity(&self, key: &AuthorKey) -> StoreResult<Option<Identity>> {
        Ok(self.read_identities()?.get(key).cloned())
    }

    fn save_identity(&self, identity: &Identity) -> StoreResult<()> {
        self.write_identities()?
            .insert(identity.key.clone(), identity.clone());
        Ok(())
    }

    fn delete_identity(&self, key: &AuthorKey) -> StoreResult<bool> {
        Ok(self.write_identities()?.remove(key).is_some())
    }

    fn repositories(&self) -> StoreResult<Vec<RepositoryRecord>> {
        Ok(self.read_repositories()?.values().cloned().collect())
    }

    fn get_repository(&self, repository: &RepositoryRef) -> StoreResult<Option<RepositoryRecord>> {
        Ok(self.read_repositories()?.get(repository).cloned())
    }

    fn save_repository(&self, record: &RepositoryRecord) -> StoreResult<()> {
        self.write_repositories()?
            .insert(record.repository.clone(), record.clone());
        Ok(())
    }

    fn delete_repository(&self, repository: &RepositoryRef) -> StoreResult<bool> {
        Ok(self.write_repositories()?.remove(repository).is_some())
    }
}
