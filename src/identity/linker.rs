//! Fixed-point linker
//!
//! Runs the matching engine over the whole pool until a pass changes nothing.
//!
//! Each pass works on a snapshot taken when the pass starts: matches are
//! evaluated (in parallel) against the snapshot, then applied on a single
//! writer. When several references feed the same candidate, they are applied
//! in ascending key order, so the fixed point does not depend on the order
//! identities were loaded in.
//!
//! Every applied change turns an empty field into a non-empty one or a
//! `false` committer flag into `true`, so the number of productive passes is
//! bounded by `pool × (fields + memberships)`.

use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::matching::{apply_link, CandidateIndex};
use crate::models::{AuthorKey, Identity};

/// Link identities in place until a fixed point is reached.
///
/// Returns the keys of every identity modified along the way, sorted.
pub fn link_all(identities: &mut [Identity]) -> Vec<AuthorKey> {
    let mut changed: BTreeSet<usize> = BTreeSet::new();
    let mut passes = 0usize;

    loop {
        passes += 1;
        let snapshot = identities.to_vec();
        let links = collect_links(&snapshot);

        let mut changed_this_pass: BTreeSet<usize> = BTreeSet::new();
        for &(candidate, reference) in &links {
            if apply_link(&snapshot[reference], &mut identities[candidate]) {
                changed_this_pass.insert(candidate);
            }
        }

        debug!(
            pass = passes,
            links = links.len(),
            changed = changed_this_pass.len(),
            "link pass complete"
        );

        if changed_this_pass.is_empty() {
            break;
        }
        changed.extend(changed_this_pass);
    }

    let mut keys: Vec<AuthorKey> = changed
        .into_iter()
        .map(|i| identities[i].key.clone())
        .collect();
    keys.sort();

    info!(
        "Linking converged after {} pass(es): {} of {} identities changed",
        passes,
        keys.len(),
        identities.len()
    );

    keys
}

/// Every (candidate, reference) pair for this pass, ordered by candidate and
/// then by reference key.
fn collect_links(snapshot: &[Identity]) -> Vec<(usize, usize)> {
    let index = CandidateIndex::new(snapshot);

    let mut links: Vec<(usize, usize)> = snapshot
        .par_iter()
        .enumerate()
        .filter(|(_, reference)| reference.is_full())
        .flat_map_iter(|(r, reference)| {
            index
                .matches(reference)
                .into_iter()
                .map(move |candidate| (candidate, r))
        })
        .collect();

    links.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| snapshot[a.1].key.cmp(&snapshot[b.1].key))
    });
    links
}
