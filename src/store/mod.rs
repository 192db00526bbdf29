//! Record storage for identities and repositories
//!
//! The import layer only talks to the [`RecordStore`] trait. Two backends are
//! provided: [`RedbStore`] persists to a single redb file, [`MemoryStore`]
//! keeps everything in memory for tests and dry runs.

mod filter;
mod memory;
mod redb_store;

pub use filter::{Condition, Field, IdentityFilter};
pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{AuthorKey, Identity, RepositoryRecord, RepositoryRef};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit failed: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Corrupt record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage of identity and repository records.
///
/// Identities are unique by [`AuthorKey`]; saving an identity replaces the
/// stored record with the same key.
pub trait RecordStore: Send + Sync {
    fn query_identities(&self, filter: &IdentityFilter) -> StoreResult<Vec<Identity>>;

    fn get_identity(&self, key: &AuthorKey) -> StoreResult<Option<Identity>>;

    fn save_identity(&self, identity: &Identity) -> StoreResult<()>;

    /// Returns whether a record was removed.
    fn delete_identity(&self, key: &AuthorKey) -> StoreResult<bool>;

    fn repositories(&self) -> StoreResult<Vec<RepositoryRecord>>;

    fn get_repository(&self, repository: &RepositoryRef) -> StoreResult<Option<RepositoryRecord>>;

    fn save_repository(&self, record: &RepositoryRecord) -> StoreResult<()>;

    /// Returns whether a record was removed.
    fn delete_repository(&self, repository: &RepositoryRef) -> StoreResult<bool>;

    fn all_identities(&self) -> StoreResult<Vec<Identity>> {
        self.query_identities(&IdentityFilter::all())
    }

    /// Clone URL of every stored repository.
    fn repository_urls(&self) -> StoreResult<BTreeMap<RepositoryRef, String>> {
        Ok(self
            .repositories()?
            .into_iter()
            .map(|record| (record.repository, record.git_url))
            .collect())
    }
}
