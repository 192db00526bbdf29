//! `ghstats repos` subcommands

use anyhow::{bail, Result};
use console::style;
use tracing::info;

use super::{output, ReposAction, Session};
use crate::import::BatchReport;
use crate::store::RecordStore;

pub(super) fn run(session: &Session, action: ReposAction) -> Result<()> {
    match action {
        ReposAction::Import {
            organizations,
            overwrite,
        } => {
            let organizations = if organizations.is_empty() {
                session.config.organizations.clone()
            } else {
                organizations
            };
            if organizations.is_empty() {
                bail!("No organization given and none configured in ghstats.toml");
            }

            let client = session.github();
            let importer = session.importer();
            let mut report = BatchReport::new();
            for organization in &organizations {
                info!("Importing repositories of {}", organization);
                match importer.import_repositories(&client, organization, overwrite) {
                    Ok(partial) => report.absorb(partial),
                    Err(e) => report.failed(organization, e),
                }
            }
            output::print_batch("Repositories", &report);
            Ok(())
        }
        ReposAction::List => {
            let records = session.store.repositories()?;
            if records.is_empty() {
                println!("{}", style("No repositories stored.").dim());
                return Ok(());
            }
            for record in &records {
                println!(
                    "  {:<48} {}",
                    style(&record.repository).cyan(),
                    style(&record.git_url).dim()
                );
            }
            println!("\n{} repositories", records.len());
            Ok(())
        }
        ReposAction::Delete => {
            let report = session.importer().delete_repositories()?;
            output::print_batch("Deleted repositories", &report);
            Ok(())
        }
    }
}
