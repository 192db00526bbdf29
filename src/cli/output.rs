//! Terminal rendering of command results

use console::style;

use crate::github::RateLimit;
use crate::import::{ActivityReport, BatchReport};
use crate::models::Identity;

/// Failures shown before the list is truncated
const MAX_LISTED_FAILURES: usize = 20;

pub fn print_batch(label: &str, report: &BatchReport) {
    let status = if report.is_clean() {
        style("[OK]").green()
    } else {
        style("[!!]").yellow()
    };
    println!(
        "  {} {}: {} changed, {} inconclusive, {} failed",
        status,
        label,
        style(report.changed.len()).bold(),
        report.inconclusive.len(),
        report.failed.len()
    );

    if !report.inconclusive.is_empty() {
        println!(
            "     {} {}",
            style("No unique GitHub user:").dim(),
            report.inconclusive.join(", ")
        );
    }
    for failure in report.failed.iter().take(MAX_LISTED_FAILURES) {
        println!("     {} {}", style("x").red(), failure);
    }
    if report.failed.len() > MAX_LISTED_FAILURES {
        println!(
            "     {}",
            style(format!(
                "... and {} more",
                report.failed.len() - MAX_LISTED_FAILURES
            ))
            .dim()
        );
    }
}

pub fn print_identities(identities: &[Identity]) {
    if identities.is_empty() {
        println!("{}", style("No authors stored.").dim());
        return;
    }
    for identity in identities {
        let name = identity.name().unwrap_or("-");
        let repositories = identity.memberships.len();
        let committer = identity.memberships.iter().filter(|(_, c)| *c).count();
        println!(
            "  {:<24} {:<36} {:<28} {} repo(s){}",
            style(identity.login()).cyan(),
            identity.email(),
            name,
            repositories,
            if committer > 0 {
                format!(", committer in {}", committer)
            } else {
                String::new()
            }
        );
    }
    println!("\n{} author(s)", identities.len());
}

/// Ranked contributor table, limited to `top` rows when non-zero.
pub fn print_activity(report: &ActivityReport, top: usize) {
    println!(
        "\n{} {} ({} repositories)\n",
        style("Contributors of").bold(),
        style(&report.scope).cyan(),
        report.repositories
    );

    if report.clusters.is_empty() {
        println!("{}", style("No commits found.").dim());
    }

    let shown = if top == 0 {
        report.clusters.len()
    } else {
        top.min(report.clusters.len())
    };
    let total = report.total_commits().max(1);
    for (rank, cluster) in report.clusters.iter().take(shown).enumerate() {
        let share = cluster.count as f64 * 100.0 / total as f64;
        let marker = if cluster.committer {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{:>4}. {} {:<32} {:>7} {:>5.1}%  {}",
            rank + 1,
            marker,
            cluster.display_name,
            cluster.count,
            share,
            style(cluster.company.as_deref().unwrap_or("")).dim()
        );
    }

    println!(
        "\n{} commits by {} contributor(s){}",
        style(report.total_commits()).bold(),
        report.clusters.len(),
        if shown < report.clusters.len() {
            format!(", top {} shown", shown)
        } else {
            String::new()
        }
    );
    if report.clusters.iter().any(|c| c.committer) {
        println!("{}", style("* committer in this scope").dim());
    }
    for skipped in &report.skipped {
        println!("  {} skipped {}", style("[!!]").yellow(), skipped);
    }
}

pub fn print_rate_limit(limit: &RateLimit) {
    let remaining = if limit.remaining == 0 {
        style(limit.remaining.to_string()).red()
    } else {
        style(limit.remaining.to_string()).green()
    };
    println!(
        "GitHub API: {} of {} requests left, resets at {}",
        remaining,
        limit.limit,
        limit.reset.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
