//! Error types for ghstats

use thiserror::Error;

use crate::git::HistoryError;
use crate::github::GitHubError;
use crate::store::StoreError;

/// Errors surfaced by the reconciliation operations.
///
/// A platform search that finds zero or several users is not an error: it
/// is reported as an inconclusive lookup and processing continues.
#[derive(Error, Debug)]
pub enum GhStatsError {
    #[error("Invalid repository scope [{input}]: {reason}")]
    InvalidScope { input: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] GitHubError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

pub type Result<T> = std::result::Result<T, GhStatsError>;
