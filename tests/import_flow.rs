//! End-to-end import flow over an in-memory store
//!
//! Repositories, authors, enrichment, committers, linking and the final
//! report, driven through [`Importer`] with scripted GitHub and history
//! sources.

mod common;

use chrono::{DateTime, TimeZone, Utc};

use common::{repo, user, FakeHistory, FakePlatform};
use ghstats::github::SearchField;
use ghstats::models::{AuthorKey, ProfileField};
use ghstats::store::{MemoryStore, RecordStore};
use ghstats::{Identity, Importer, RepositoryScope};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
}

fn platform() -> FakePlatform {
    FakePlatform::default()
        .with_organization("xwiki", &["xwiki-commons", "xwiki-platform"])
        .with_user(user("vmassol", "Vincent Massol", "https://avatars/vmassol.png"))
        .with_search(SearchField::Login, "vmassol", &["vmassol"])
        .with_collaborators(repo("xwiki", "xwiki-platform"), &["vmassol"])
        .rate_limited_on("tmortagne")
}

fn history() -> FakeHistory {
    FakeHistory::default()
        .with_commits(
            repo("xwiki", "xwiki-commons"),
            &[
                ("vmassol", "v@x.org", day(1)),
                ("Vincent Massol", "vincent@gmail.com", day(2)),
                ("vmassol", "v@x.org", day(3)),
            ],
        )
        .with_commits(
            repo("xwiki", "xwiki-platform"),
            &[
                ("vmassol", "v@x.org", day(4)),
                ("tmortagne", "t@x.org", day(5)),
                ("tmortagne", "t@x.org", day(6)),
                ("tmortagne", "t@x.org", day(7)),
            ],
        )
}

#[test]
fn test_import_repositories_only_saves_new_records() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    let client = platform();

    let first = importer.import_repositories(&client, "xwiki", false).unwrap();
    assert_eq!(first.changed.len(), 2);
    let again = importer.import_repositories(&client, "xwiki", false).unwrap();
    assert!(again.changed.is_empty());

    let stored = store.get_repository(&repo("xwiki", "xwiki-commons")).unwrap().unwrap();
    assert_eq!(stored.git_url, "https://github.com/xwiki/xwiki-commons.git");

    assert!(importer.import_repositories(&client, "unknown", false).is_err());
}

#[test]
fn test_import_authors_is_additive() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    importer.import_repositories(&platform(), "xwiki", false).unwrap();

    let report = importer.import_authors(&history()).unwrap();
    assert_eq!(report.changed.len(), 3);
    assert!(report.is_clean());

    let vmassol = store
        .get_identity(&AuthorKey::new("vmassol", "v@x.org"))
        .unwrap()
        .unwrap();
    assert_eq!(vmassol.memberships.len(), 2);

    let again = importer.import_authors(&history()).unwrap();
    assert!(again.changed.is_empty());
}

#[test]
fn test_import_authors_reports_missing_clones() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    importer.import_repositories(&platform(), "xwiki", false).unwrap();

    let partial = FakeHistory::default().with_commits(
        repo("xwiki", "xwiki-commons"),
        &[("vmassol", "v@x.org", day(1))],
    );
    let report = importer.import_authors(&partial).unwrap();
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].subject, "xwiki/xwiki-platform");
}

#[test]
fn test_full_flow_produces_ranked_report() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    let client = platform();
    let history = history();

    importer.import_repositories(&client, "xwiki", false).unwrap();
    importer.import_authors(&history).unwrap();

    let enriched = importer.enrich_authors(&client, false).unwrap();
    assert_eq!(enriched.changed.len(), 1);
    assert_eq!(enriched.inconclusive.len(), 1);
    // The rate limited lookup is recorded, the batch goes on
    assert_eq!(enriched.failed.len(), 1);
    assert_eq!(enriched.failed[0].subject, "tmortagne <t@x.org>");

    let committers = importer.import_all_committers(&client).unwrap();
    assert_eq!(committers.changed, vec!["vmassol <v@x.org>"]);

    let linked = importer.link().unwrap();
    assert_eq!(linked.changed, vec!["Vincent Massol <vincent@gmail.com>"]);
    let alias = store
        .get_identity(&AuthorKey::new("Vincent Massol", "vincent@gmail.com"))
        .unwrap()
        .unwrap();
    assert_eq!(
        alias.profile.get(ProfileField::Avatar),
        Some("https://avatars/vmassol.png")
    );
    assert!(importer.link().unwrap().changed.is_empty());

    let scope = RepositoryScope::parse("xwiki/*").unwrap();
    let report = importer.report(&history, &scope, None).unwrap();
    assert_eq!(report.repositories, 2);
    assert_eq!(report.total_commits(), 7);
    assert_eq!(report.clusters.len(), 2);

    let top = &report.clusters[0];
    assert_eq!(top.display_name, "Vincent Massol");
    assert_eq!(top.count, 4);
    assert!(top.committer);
    assert_eq!(top.avatar.as_deref(), Some("https://avatars/vmassol.png"));
    assert_eq!(report.clusters[1].display_name, "tmortagne");
    assert!(!report.clusters[1].committer);
}

#[test]
fn test_report_scope_and_since() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    importer.import_repositories(&platform(), "xwiki", false).unwrap();
    importer.import_authors(&history()).unwrap();

    let commons = RepositoryScope::parse("xwiki/xwiki-commons").unwrap();
    let report = importer.report(&history(), &commons, None).unwrap();
    assert_eq!(report.repositories, 1);
    // Not linked yet: the git name alias is its own contributor
    assert_eq!(report.clusters.len(), 2);
    assert_eq!(report.total_commits(), 3);

    let everything = RepositoryScope::parse("xwiki/*").unwrap();
    let recent = importer.report(&history(), &everything, Some(day(5))).unwrap();
    assert_eq!(recent.total_commits(), 3);
    assert_eq!(recent.clusters[0].display_name, "tmortagne");
}

#[test]
fn test_report_skips_unreadable_repositories() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    importer.import_repositories(&platform(), "xwiki", false).unwrap();
    importer.import_authors(&history()).unwrap();

    let partial = FakeHistory::default().with_commits(
        repo("xwiki", "xwiki-platform"),
        &[("tmortagne", "t@x.org", day(5))],
    );
    let scope = RepositoryScope::parse("xwiki/*").unwrap();
    let report = importer.report(&partial, &scope, None).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].subject, "xwiki/xwiki-commons");
    assert_eq!(report.total_commits(), 1);
}

#[test]
fn test_create_author_uses_fallback_email() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    let client = platform();

    let report = importer
        .create_author(&client, "vmassol", "vincent@xwiki.com", false)
        .unwrap();
    assert_eq!(report.changed, vec!["vmassol <vincent@xwiki.com>"]);
    let created = store
        .get_identity(&AuthorKey::new("vmassol", "vincent@xwiki.com"))
        .unwrap()
        .unwrap();
    assert_eq!(created.name(), Some("Vincent Massol"));

    let again = importer
        .create_author(&client, "vmassol", "vincent@xwiki.com", false)
        .unwrap();
    assert!(again.changed.is_empty());

    let unknown = importer.create_author(&client, "ghost", "", false).unwrap();
    assert_eq!(unknown.inconclusive, vec!["ghost"]);
}

#[test]
fn test_committer_without_identity_is_created_from_full_profile() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    let mut caleb = user("cjdelisle", "Caleb James DeLisle", "https://avatars/cjd.png");
    caleb.email = Some("cjd@x.org".to_string());
    caleb.company = Some("XWiki SAS".to_string());
    let client = FakePlatform::default()
        .with_user(caleb)
        .with_collaborators(repo("xwiki", "xwiki-platform"), &["cjdelisle"]);

    let report = importer
        .import_committers(&client, &repo("xwiki", "xwiki-platform"))
        .unwrap();
    assert_eq!(report.changed, vec!["cjdelisle <cjd@x.org>"]);

    let created = store
        .get_identity(&AuthorKey::new("cjdelisle", "cjd@x.org"))
        .unwrap()
        .unwrap();
    assert!(created
        .memberships
        .is_committer(&repo("xwiki", "xwiki-platform")));
    assert_eq!(created.name(), Some("Caleb James DeLisle"));
    assert_eq!(created.profile.get(ProfileField::Company), Some("XWiki SAS"));
}

#[test]
fn test_unknown_collaborator_falls_back_to_listing() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    let client =
        FakePlatform::default().with_collaborators(repo("xwiki", "xwiki-platform"), &["ghost"]);

    let report = importer
        .import_committers(&client, &repo("xwiki", "xwiki-platform"))
        .unwrap();
    assert_eq!(report.changed, vec!["ghost <>"]);
}

#[test]
fn test_enrich_looks_up_every_record_of_a_login() {
    let store = MemoryStore::new();
    store.save_identity(&Identity::new("Gabriela", "g1@x.org")).unwrap();
    store.save_identity(&Identity::new("Gabriela", "g2@x.org")).unwrap();
    let importer = Importer::new(&store);
    let client = FakePlatform::default()
        .with_user(user("gsmeu", "Gabriela Smeu", "https://avatars/gsmeu.png"))
        .with_search(SearchField::Login, "Gabriela", &["gabriela", "gabriela-s"])
        .with_search(SearchField::Email, "g2@x.org", &["gsmeu"]);

    let report = importer.enrich_authors(&client, false).unwrap();
    assert_eq!(report.inconclusive, vec!["Gabriela <g1@x.org>"]);
    assert!(report.is_clean());

    let second = store
        .get_identity(&AuthorKey::new("Gabriela", "g2@x.org"))
        .unwrap()
        .unwrap();
    assert_eq!(
        second.profile.get(ProfileField::Avatar),
        Some("https://avatars/gsmeu.png")
    );
    // The located profile is shared with every record of the login
    let first = store
        .get_identity(&AuthorKey::new("Gabriela", "g1@x.org"))
        .unwrap()
        .unwrap();
    assert_eq!(first.name(), Some("Gabriela Smeu"));
}

#[test]
fn test_enrich_retries_records_after_a_rate_limited_sibling() {
    let store = MemoryStore::new();
    store.save_identity(&Identity::new("Gabriela", "g1@x.org")).unwrap();
    store.save_identity(&Identity::new("Gabriela", "g2@x.org")).unwrap();
    let importer = Importer::new(&store);
    let client = FakePlatform::default()
        .with_user(user("gsmeu", "Gabriela Smeu", "https://avatars/gsmeu.png"))
        .with_search(SearchField::Email, "g2@x.org", &["gsmeu"])
        .rate_limited_on("g1@x.org");

    let report = importer.enrich_authors(&client, false).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].subject, "Gabriela <g1@x.org>");

    let second = store
        .get_identity(&AuthorKey::new("Gabriela", "g2@x.org"))
        .unwrap()
        .unwrap();
    assert_eq!(second.name(), Some("Gabriela Smeu"));
}

#[test]
fn test_enrich_skips_records_filled_by_an_earlier_lookup() {
    let store = MemoryStore::new();
    store.save_identity(&Identity::new("vmassol", "v1@x.org")).unwrap();
    store.save_identity(&Identity::new("vmassol", "v2@x.org")).unwrap();
    let importer = Importer::new(&store);
    let client = FakePlatform::default()
        .with_user(user("vmassol", "Vincent Massol", "https://avatars/vmassol.png"))
        .with_search(SearchField::Login, "vmassol", &["vmassol", "vmassol-bot"])
        .with_search(SearchField::Email, "v1@x.org", &["vmassol"])
        .rate_limited_on("v2@x.org");

    // The second record is filled by the first lookup and never searched
    let report = importer.enrich_authors(&client, false).unwrap();
    assert_eq!(report.changed.len(), 2);
    assert!(report.is_clean());
}

#[test]
fn test_delete_everything() {
    let store = MemoryStore::new();
    let importer = Importer::new(&store);
    importer.import_repositories(&platform(), "xwiki", false).unwrap();
    importer.import_authors(&history()).unwrap();

    assert_eq!(importer.delete_authors().unwrap().changed.len(), 3);
    assert_eq!(importer.delete_repositories().unwrap().changed.len(), 2);
    assert!(store.all_identities().unwrap().is_empty());
    assert!(store.repositories().unwrap().is_empty());
}
