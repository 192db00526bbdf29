//! Outcome records for batch operations

use serde::Serialize;
use std::fmt;

use crate::models::ClusterSummary;

/// A subject a batch operation could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub subject: String,
    pub reason: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.reason)
    }
}

/// Result of a batch operation.
///
/// Only subjects that actually changed are listed in `changed`, so re-running
/// a batch after fixing failures is safe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub changed: Vec<String>,
    /// Platform lookups that returned zero or several users
    pub inconclusive: Vec<String>,
    pub failed: Vec<Failure>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&mut self, subject: impl fmt::Display) {
        self.changed.push(subject.to_string());
    }

    pub fn inconclusive(&mut self, subject: impl fmt::Display) {
        self.inconclusive.push(subject.to_string());
    }

    pub fn failed(&mut self, subject: impl fmt::Display, reason: impl fmt::Display) {
        self.failed.push(Failure {
            subject: subject.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn absorb(&mut self, other: BatchReport) {
        self.changed.extend(other.changed);
        self.inconclusive.extend(other.inconclusive);
        self.failed.extend(other.failed);
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Aggregated commit activity for a repository scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityReport {
    pub scope: String,
    pub repositories: usize,
    pub clusters: Vec<ClusterSummary>,
    /// Repositories whose history could not be read
    pub skipped: Vec<Failure>,
}

impl ActivityReport {
    pub fn total_commits(&self) -> u64 {
        self.clusters.iter().map(|c| c.count).sum()
    }
}
