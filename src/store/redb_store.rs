//! Persistent record store on top of redb
//!
//! Records are stored as JSON blobs. Identities are keyed by
//! `login\0email`, repositories by `organization/repository`.

use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{IdentityFilter, RecordStore, StoreResult};
use crate::models::{AuthorKey, Identity, RepositoryRecord, RepositoryRef};

const IDENTITIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");
const REPOSITORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("repositories");

fn identity_key(key: &AuthorKey) -> String {
    format!("{}\u{0}{}", key.login, key.email)
}

fn repository_key(repository: &RepositoryRef) -> String {
    repository.to_string()
}

pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Create or open the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Make sure both tables exist so readers never see a missing table
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(IDENTITIES_TABLE)?;
            write_txn.open_table(REPOSITORIES_TABLE)?;
        }
        write_txn.commit()?;

        debug!("Opened record store at {}", path.display());
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn put(&self, table: TableDefinition<&str, &[u8]>, key: &str, value: &[u8]) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, table: TableDefinition<&str, &[u8]>, key: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(table)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StoreResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let entry = table.get(key)?;
        let record = match entry {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(record)
    }

    fn scan<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
    ) -> StoreResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let mut records = Vec::new();
        for item in table.range::<&str>(..)? {
            let (_, value) = item?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }
}

impl RecordStore for RedbStore {
    fn query_identities(&self, filter: &IdentityFilter) -> StoreResult<Vec<Identity>> {
        let identities: Vec<Identity> = self.scan(IDENTITIES_TABLE)?;
        Ok(identities
            .into_iter()
            .filter(|identity| filter.matches(identity))
            .collect())
    }

    fn get_identity(&self, key: &AuthorKey) -> StoreResult<Option<Identity>> {
        self.get(IDENTITIES_TABLE, &identity_key(key))
    }

    fn save_identity(&self, identity: &Identity) -> StoreResult<()> {
        let value = serde_json::to_vec(identity)?;
        self.put(IDENTITIES_TABLE, &identity_key(&identity.key), &value)
    }

    fn delete_identity(&self, key: &AuthorKey) -> StoreResult<bool> {
        self.remove(IDENTITIES_TABLE, &identity_key(key))
    }

    fn repositories(&self) -> StoreResult<Vec<RepositoryRecord>> {
        self.scan(REPOSITORIES_TABLE)
    }

    fn get_repository(&self, repository: &RepositoryRef) -> StoreResult<Option<RepositoryRecord>> {
        self.get(REPOSITORIES_TABLE, &repository_key(repository))
    }

    fn save_repository(&self, record: &RepositoryRecord) -> StoreResult<()> {
        let value = serde_json::to_vec(record)?;
        self.put(
            REPOSITORIES_TABLE,
            &repository_key(&record.repository),
            &value,
        )
    }

    fn delete_repository(&self, repository: &RepositoryRef) -> StoreResult<bool> {
        self.remove(REPOSITORIES_TABLE, &repository_key(repository))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Field;
    use tempfile::tempdir;

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("nested").join("ghstats.redb");
        let repo = RepositoryRef::new("xwiki", "xwiki-platform");

        {
            let store = RedbStore::open(&path).expect("open store");
            store
                .save_identity(
                    &Identity::new("vmassol", "vincent@massol.net")
                        .with_name("Vincent Massol")
                        .with_membership(repo.clone(), true),
                )
                .expect("save identity");
            store
                .save_repository(&RepositoryRecord {
                    repository: repo.clone(),
                    git_url: "https://github.com/xwiki/xwiki-platform.git".into(),
                    html_url: Some("https://github.com/xwiki/xwiki-platform".into()),
                })
                .expect("save repository");
            drop(store);
        }

        let store = RedbStore::open(&path).expect("reopen store");
        let identity = store
            .get_identity(&AuthorKey::new("vmassol", "vincent@massol.net"))
            .expect("read identity")
            .expect("identity persisted");
        assert_eq!(identity.name(), Some("Vincent Massol"));
        assert!(identity.memberships.is_committer(&repo));
        assert_eq!(store.repositories().expect("list").len(), 1);
    }

    #[test]
    fn test_query_and_delete() {
        let dir = tempdir().expect("create temp dir");
        let store = RedbStore::open(&dir.path().join("db.redb")).expect("open store");
        store.save_identity(&Identity::new("a", "a@x.org")).unwrap();
        store.save_identity(&Identity::new("a", "a2@x.org")).unwrap();
        store.save_identity(&Identity::new("ab", "a@x.org")).unwrap();

        let same_login = store
            .query_identities(&IdentityFilter::login("a"))
            .unwrap();
        assert_eq!(same_login.len(), 2);

        let same_email = store
            .query_identities(&IdentityFilter::all().equals(Field::Email, "a@x.org"))
            .unwrap();
        assert_eq!(same_email.len(), 2);

        assert!(store.delete_identity(&AuthorKey::new("a", "a2@x.org")).unwrap());
        assert!(!store.delete_identity(&AuthorKey::new("a", "a2@x.org")).unwrap());
        assert_eq!(store.all_identities().unwrap().len(), 2);
    }

    #[test]
    fn test_key_separator_keeps_logins_distinct() {
        assert_ne!(
            identity_key(&AuthorKey::new("a", "b@x")),
            identity_key(&AuthorKey::new("a b", "@x"))
        );
    }
}
