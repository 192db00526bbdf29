//! `ghstats report` command

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use super::{output, Session};

pub(super) fn run(
    session: &Session,
    scope: Option<&str>,
    since: Option<&str>,
    format: &str,
    top: Option<usize>,
) -> Result<()> {
    let scope = session.scope(scope)?;
    let since = since.map(parse_since).transpose()?;
    let top = top.or(session.config.report.top).unwrap_or(0);

    let mut report = session
        .importer()
        .report(&session.history(), &scope, since)?;

    match format {
        "json" => {
            if top > 0 {
                report.clusters.truncate(top);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => output::print_activity(&report, top),
    }
    Ok(())
}

/// Start of the given day, UTC.
fn parse_since(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid --since date [{}], expected YYYY-MM-DD", input))?;
    let start = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid --since date [{}]", input))?;
    Ok(start.and_utc())
}
