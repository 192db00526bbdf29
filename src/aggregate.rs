//! Commit aggregation per reconciled contributor
//!
//! Authors referenced by commit activity are grouped into clusters: the
//! connected components of the graph where two authors are adjacent when
//! they share a resolved name or an email. Each cluster is reduced to one
//! [`ClusterSummary`].

use petgraph::unionfind::UnionFind;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{AuthorKey, ClusterSummary, CommitActivity, ProfileView};

/// Group commit activity into clusters of co-referent authors.
///
/// Rows whose author is missing from `identities` are dropped. Clusters are
/// sorted by commit count, highest first; ties keep the order in which the
/// cluster first appeared in `activity`.
pub fn aggregate(
    activity: &[CommitActivity],
    identities: &HashMap<AuthorKey, ProfileView>,
) -> Vec<ClusterSummary> {
    // Known authors, in order of first appearance
    let mut nodes: Vec<(&AuthorKey, &ProfileView)> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    let mut node_of: HashMap<&AuthorKey, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in activity {
        let Some((key, view)) = identities.get_key_value(&row.author) else {
            dropped += 1;
            continue;
        };
        let node = *node_of.entry(key).or_insert_with(|| {
            nodes.push((key, view));
            counts.push(0);
            nodes.len() - 1
        });
        counts[node] += row.count;
    }

    if dropped > 0 {
        debug!("Dropped {} activity row(s) from unknown authors", dropped);
    }

    let mut components = UnionFind::<usize>::new(nodes.len());
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    let mut by_email: HashMap<&str, usize> = HashMap::new();
    for (node, (key, view)) in nodes.iter().enumerate() {
        let name = view.resolved_name(key);
        if !name.is_empty() {
            join_on(&mut by_name, name, node, &mut components);
        }
        if !key.email.is_empty() {
            join_on(&mut by_email, &key.email, node, &mut components);
        }
    }

    // Clusters in order of first appearance
    let mut cluster_of_root: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for node in 0..nodes.len() {
        let root = components.find(node);
        let cluster = *cluster_of_root.entry(root).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[cluster].push(node);
    }

    let mut summaries: Vec<ClusterSummary> = clusters
        .iter()
        .map(|members| reduce(members, &nodes, &counts))
        .collect();

    // Stable: equal counts keep first-appearance order
    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn join_on<'a>(
    seen: &mut HashMap<&'a str, usize>,
    value: &'a str,
    node: usize,
    components: &mut UnionFind<usize>,
) {
    match seen.entry(value) {
        Entry::Occupied(first) => {
            components.union(*first.get(), node);
        }
        Entry::Vacant(slot) => {
            slot.insert(node);
        }
    }
}

fn reduce(
    members: &[usize],
    nodes: &[(&AuthorKey, &ProfileView)],
    counts: &[u64],
) -> ClusterSummary {
    let (first_key, first_view) = nodes[members[0]];

    ClusterSummary {
        display_name: first_view.resolved_name(first_key).to_string(),
        count: members.iter().map(|&m| counts[m]).sum(),
        avatar: first_non_empty(members, nodes, |v| v.avatar.as_deref()),
        company: first_non_empty(members, nodes, |v| v.company.as_deref()),
        committer: members.iter().any(|&m| nodes[m].1.committer),
        members: members.iter().map(|&m| nodes[m].0.clone()).collect(),
    }
}

fn first_non_empty(
    members: &[usize],
    nodes: &[(&AuthorKey, &ProfileView)],
    pick: impl Fn(&ProfileView) -> Option<&str>,
) -> Option<String> {
    members
        .iter()
        .filter_map(|&m| pick(nodes[m].1))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
