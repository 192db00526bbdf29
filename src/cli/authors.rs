//! `ghstats authors` subcommands

use anyhow::Result;

use super::{output, AuthorsAction, Session};
use crate::store::{IdentityFilter, RecordStore};

pub(super) fn run(session: &Session, action: AuthorsAction) -> Result<()> {
    let importer = session.importer();
    match action {
        AuthorsAction::Import => {
            let report = importer.import_authors(&session.history())?;
            output::print_batch("Authors", &report);
        }
        AuthorsAction::Enrich { overwrite } => {
            let report = importer.enrich_authors(&session.github(), overwrite)?;
            output::print_batch("Enriched authors", &report);
        }
        AuthorsAction::Create {
            login,
            email,
            overwrite,
        } => {
            let report = importer.create_author(&session.github(), &login, &email, overwrite)?;
            output::print_batch("Created authors", &report);
        }
        AuthorsAction::List { scope } => {
            let identities = match scope {
                Some(scope) => {
                    let repositories = importer.resolve_scope(&session.scope(Some(scope.as_str()))?)?;
                    session
                        .store
                        .query_identities(&IdentityFilter::all().member_of_any(repositories))?
                }
                None => session.store.all_identities()?,
            };
            output::print_identities(&identities);
        }
        AuthorsAction::Delete => {
            let report = importer.delete_authors()?;
            output::print_batch("Deleted authors", &report);
        }
    }
    Ok(())
}
