//! Store-backed orchestration
//!
//! [`Importer`] drives the collaborators (record store, GitHub client and
//! history scanner) and the identity engine. Every batch operation continues
//! past subjects that fail and reports them in a [`BatchReport`]; only
//! caller-input errors and failures of the whole batch's source abort a call.

mod report;

pub use report::{ActivityReport, BatchReport, Failure};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::error::Result;
use crate::git::HistoryScanner;
use crate::github::{locate_user, PlatformClient, PlatformUser};
use crate::identity::{profile_views, IdentityPool};
use crate::models::{AuthorKey, Identity, ProfileField, ProfileView, RepositoryRef};
use crate::scope::RepositoryScope;
use crate::store::{Condition, Field, IdentityFilter, RecordStore};

pub struct Importer<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Save the repositories of `organization`: new ones always, known ones
    /// only when `overwrite` is set and the record differs.
    pub fn import_repositories(
        &self,
        client: &dyn PlatformClient,
        organization: &str,
        overwrite: bool,
    ) -> Result<BatchReport> {
        let remote = client.organization_repositories(organization)?;
        info!("{} lists {} repositories", organization, remote.len());

        let mut report = BatchReport::new();
        for repository in remote {
            let record = repository.into_record(organization);
            let subject = record.repository.clone();
            let outcome = self.store.get_repository(&subject).and_then(|existing| {
                let save = match existing {
                    None => true,
                    Some(existing) => overwrite && existing != record,
                };
                if save {
                    self.store.save_repository(&record)?;
                }
                Ok(save)
            });
            match outcome {
                Ok(true) => report.changed(subject),
                Ok(false) => {}
                Err(e) => report.failed(subject, e),
            }
        }
        Ok(report)
    }

    pub fn delete_repositories(&self) -> Result<BatchReport> {
        let mut report = BatchReport::new();
        for record in self.store.repositories()? {
            match self.store.delete_repository(&record.repository) {
                Ok(true) => report.changed(&record.repository),
                Ok(false) => {}
                Err(e) => report.failed(&record.repository, e),
            }
        }
        Ok(report)
    }

    pub fn delete_authors(&self) -> Result<BatchReport> {
        let mut report = BatchReport::new();
        for identity in self.store.all_identities()? {
            match self.store.delete_identity(&identity.key) {
                Ok(true) => report.changed(&identity.key),
                Ok(false) => {}
                Err(e) => report.failed(&identity.key, e),
            }
        }
        Ok(report)
    }

    /// Record the commit authors of every stored repository.
    ///
    /// New (name, email) pairs become identities; known ones gain the
    /// memberships they were missing. Nothing is ever removed.
    pub fn import_authors(&self, scanner: &dyn HistoryScanner) -> Result<BatchReport> {
        let mut report = BatchReport::new();

        let mut contributions: BTreeMap<AuthorKey, BTreeSet<RepositoryRef>> = BTreeMap::new();
        for record in self.store.repositories()? {
            match scanner.authors(&record.repository) {
                Ok(authors) => {
                    debug!("{}: {} author(s)", record.repository, authors.len());
                    for author in authors {
                        contributions
                            .entry(author)
                            .or_default()
                            .insert(record.repository.clone());
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", record.repository, e);
                    report.failed(&record.repository, e);
                }
            }
        }

        let mut known: HashMap<AuthorKey, Identity> = self
            .store
            .all_identities()?
            .into_iter()
            .map(|identity| (identity.key.clone(), identity))
            .collect();

        for (key, repositories) in contributions {
            let (mut identity, mut changed) = match known.remove(&key) {
                Some(identity) => (identity, false),
                None => (Identity::from_key(key), true),
            };
            for repository in repositories {
                changed |= identity.memberships.insert(repository);
            }
            if !changed {
                continue;
            }
            match self.store.save_identity(&identity) {
                Ok(()) => report.changed(&identity.key),
                Err(e) => report.failed(&identity.key, e),
            }
        }

        info!("Imported authors: {} changed", report.changed.len());
        Ok(report)
    }

    /// Fill identity profiles from the platform.
    ///
    /// Identities missing a name or an avatar are looked up (every identity
    /// when `overwrite` is set). A located user's profile is applied to all
    /// stored identities sharing the looked-up login.
    pub fn enrich_authors(
        &self,
        client: &dyn PlatformClient,
        overwrite: bool,
    ) -> Result<BatchReport> {
        let filter = if overwrite {
            IdentityFilter::all()
        } else {
            IdentityFilter::all().with(Condition::Any(vec![
                Condition::Empty(Field::Profile(ProfileField::Name)),
                Condition::Empty(Field::Profile(ProfileField::Avatar)),
            ]))
        };
        let candidates = self.store.query_identities(&filter)?;
        info!("Looking up {} author(s) on GitHub", candidates.len());

        let mut report = BatchReport::new();
        // Logins whose located profile was already applied to every identity sharing them
        let mut located: HashSet<String> = HashSet::new();
        for candidate in candidates {
            if located.contains(candidate.login()) && self.is_enriched(&candidate.key, overwrite) {
                debug!("{} already filled through its login", candidate);
                continue;
            }
            match locate_user(client, &candidate) {
                Ok(Some(user)) => {
                    let applied = self.apply_user(candidate.login(), &user, overwrite);
                    if applied.is_clean() {
                        located.insert(candidate.login().to_string());
                    }
                    report.absorb(applied);
                }
                Ok(None) => {
                    debug!("No unique GitHub user for {}", candidate);
                    report.inconclusive(&candidate.key);
                }
                Err(e) => {
                    warn!("Failed to locate {}: {}", candidate, e);
                    report.failed(&candidate.key, e);
                }
            }
        }
        Ok(report)
    }

    /// Whether the stored record for `key` no longer needs a lookup. With
    /// `overwrite` every record sharing a located login was already replaced.
    fn is_enriched(&self, key: &AuthorKey, overwrite: bool) -> bool {
        if overwrite {
            return true;
        }
        match self.store.get_identity(key) {
            Ok(Some(identity)) => {
                identity.name().is_some() && identity.profile.get(ProfileField::Avatar).is_some()
            }
            _ => false,
        }
    }

    fn apply_user(&self, login: &str, user: &PlatformUser, overwrite: bool) -> BatchReport {
        let mut report = BatchReport::new();
        let profile = user.profile();
        let targets = match self.store.query_identities(&IdentityFilter::login(login)) {
            Ok(targets) => targets,
            Err(e) => {
                report.failed(login, e);
                return report;
            }
        };
        for mut identity in targets {
            if !identity.apply_profile(&profile, overwrite) {
                continue;
            }
            match self.store.save_identity(&identity) {
                Ok(()) => report.changed(&identity.key),
                Err(e) => report.failed(&identity.key, e),
            }
        }
        report
    }

    /// Create or update the identity of the platform user `login`.
    ///
    /// The user's public email is used when set, `fallback_email` otherwise.
    pub fn create_author(
        &self,
        client: &dyn PlatformClient,
        login: &str,
        fallback_email: &str,
        overwrite: bool,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::new();
        let Some(user) = client.find_user_by_login(login)? else {
            report.inconclusive(login);
            return Ok(report);
        };

        let email = user.public_email().unwrap_or(fallback_email);
        let key = AuthorKey::new(user.login.as_str(), email);
        let (mut identity, created) = match self.store.get_identity(&key)? {
            Some(identity) => (identity, false),
            None => (Identity::from_key(key), true),
        };
        let updated = identity.apply_profile(&user.profile(), overwrite);
        if created || updated {
            self.store.save_identity(&identity)?;
            report.changed(&identity.key);
        }
        Ok(report)
    }

    /// Flag the collaborators of `repository` as its committers.
    ///
    /// Every stored identity with a collaborator's login gets the flag; a
    /// collaborator without any stored identity is created from the platform
    /// profile.
    pub fn import_committers(
        &self,
        client: &dyn PlatformClient,
        repository: &RepositoryRef,
    ) -> Result<BatchReport> {
        let collaborators = client.collaborators(repository)?;
        debug!("{} has {} collaborator(s)", repository, collaborators.len());

        let mut report = BatchReport::new();
        for user in collaborators {
            let identities = match self.store.query_identities(&IdentityFilter::login(&user.login)) {
                Ok(identities) => identities,
                Err(e) => {
                    report.failed(&user.login, e);
                    continue;
                }
            };

            let updates: Vec<Identity> = if identities.is_empty() {
                // Collaborator listings only carry login and avatar
                let details = match client.find_user_by_login(&user.login) {
                    Ok(details) => details.unwrap_or_else(|| user.clone()),
                    Err(e) => {
                        warn!("Failed to fetch collaborator {}: {}", user.login, e);
                        report.failed(&user.login, e);
                        continue;
                    }
                };
                let mut identity = Identity::new(
                    details.login.as_str(),
                    details.public_email().unwrap_or_default(),
                );
                identity.apply_profile(&details.profile(), false);
                identity.apply_profile(&user.profile(), false);
                identity.memberships.mark_committer(repository);
                vec![identity]
            } else {
                identities
                    .into_iter()
                    .filter_map(|mut identity| {
                        identity
                            .memberships
                            .mark_committer(repository)
                            .then_some(identity)
                    })
                    .collect()
            };

            for identity in updates {
                match self.store.save_identity(&identity) {
                    Ok(()) => report.changed(&identity.key),
                    Err(e) => report.failed(&identity.key, e),
                }
            }
        }
        Ok(report)
    }

    /// [`Importer::import_committers`] for every stored repository.
    pub fn import_all_committers(&self, client: &dyn PlatformClient) -> Result<BatchReport> {
        let mut report = BatchReport::new();
        for record in self.store.repositories()? {
            match self.import_committers(client, &record.repository) {
                Ok(partial) => report.absorb(partial),
                Err(e) => {
                    warn!("Failed to import committers of {}: {}", record.repository, e);
                    report.failed(&record.repository, e);
                }
            }
        }
        Ok(report)
    }

    /// Run the fixed-point linker over every stored identity and persist
    /// the ones that changed.
    pub fn link(&self) -> Result<BatchReport> {
        let mut pool: IdentityPool = self.store.all_identities()?.into_iter().collect();
        let changed = pool.link_all();

        let mut report = BatchReport::new();
        for key in changed {
            let Some(identity) = pool.get(&key) else {
                continue;
            };
            match self.store.save_identity(identity) {
                Ok(()) => report.changed(&key),
                Err(e) => report.failed(&key, e),
            }
        }
        Ok(report)
    }

    /// Stored repositories selected by `scope`, sorted.
    pub fn resolve_scope(&self, scope: &RepositoryScope) -> Result<Vec<RepositoryRef>> {
        let known: Vec<RepositoryRef> = self
            .store
            .repositories()?
            .into_iter()
            .map(|record| record.repository)
            .collect();
        let mut repositories: Vec<RepositoryRef> = scope.resolve(&known).into_iter().collect();
        repositories.sort();
        Ok(repositories)
    }

    /// Profile views of the identities contributing to `scope`.
    pub fn authors_for_scope(
        &self,
        scope: &RepositoryScope,
    ) -> Result<HashMap<AuthorKey, ProfileView>> {
        let repositories: HashSet<RepositoryRef> =
            self.resolve_scope(scope)?.into_iter().collect();
        let identities = self
            .store
            .query_identities(&IdentityFilter::all().member_of_any(repositories.iter().cloned()))?;
        Ok(profile_views(&identities, &repositories))
    }

    /// Commit activity of `scope`, clustered per contributor.
    ///
    /// Repositories whose history cannot be read are listed in `skipped`.
    pub fn report(
        &self,
        scanner: &dyn HistoryScanner,
        scope: &RepositoryScope,
        since: Option<DateTime<Utc>>,
    ) -> Result<ActivityReport> {
        let repositories = self.resolve_scope(scope)?;
        let views = self.authors_for_scope(scope)?;

        let scans: Vec<_> = repositories
            .par_iter()
            .map(|repository| (repository, scanner.commit_activity(repository, since)))
            .collect();

        let mut activity = Vec::new();
        let mut skipped = Vec::new();
        for (repository, scan) in scans {
            match scan {
                Ok(rows) => activity.extend(rows),
                Err(e) => {
                    warn!("Skipping {}: {}", repository, e);
                    skipped.push(Failure {
                        subject: repository.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let clusters = aggregate(&activity, &views);
        info!(
            "{} contributor(s) across {} repositories",
            clusters.len(),
            repositories.len()
        );
        Ok(ActivityReport {
            scope: scope.to_string(),
            repositories: repositories.len(),
            clusters,
            skipped,
        })
    }
}
