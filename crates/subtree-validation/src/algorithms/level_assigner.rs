//! Level Assigner
//!
//! Kahn's topological sort over the in-batch graph, assigning each
//! transaction the length of the longest in-batch path leading to it.
//! O(V + E), iterative, detects cycles.

use crate::domain::entities::{BatchTransaction, DependencyGraph, ExternalStatuses, LevelMap};
use crate::domain::errors::SchedulingError;
use crate::domain::value_objects::{ExternalStatus, Hash, PendingParentPolicy};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Assign every transaction of the graph to a level.
///
/// External references are checked first: any `NotFound` parent fails the
/// batch, then any `PendingElsewhere` parent fails it according to `policy`.
/// Only fully confirmed roots are seeded at level 0. The result depends only
/// on the graph and the status snapshot, not on the order of the batch.
pub fn assign_levels(
    graph: &DependencyGraph,
    statuses: &ExternalStatuses,
    policy: PendingParentPolicy,
) -> Result<LevelMap, SchedulingError> {
    if graph.node_count() == 0 {
        return Ok(LevelMap::default());
    }

    // Index order keeps error attribution and queue order reproducible
    let nodes = graph.ordered_nodes();

    check_external_parents(graph, statuses, &nodes, policy)?;

    // 1. In-degree = number of distinct in-batch parents
    let mut in_degree: HashMap<Hash, usize> = nodes
        .iter()
        .map(|tx| (tx.hash(), graph.parents_of(&tx.hash()).len()))
        .collect();

    // 2. Seed with roots; all of them have confirmed external parents
    let mut levels: HashMap<Hash, u32> = HashMap::with_capacity(nodes.len());
    let mut queue: VecDeque<Hash> = VecDeque::new();
    for tx in &nodes {
        if in_degree.get(&tx.hash()) == Some(&0) {
            levels.insert(tx.hash(), 0);
            queue.push_back(tx.hash());
        }
    }

    // 3. Relax children: level(child) = 1 + max(level(parent))
    let mut processed = 0;
    let mut max_level = 0;
    while let Some(node) = queue.pop_front() {
        processed += 1;
        let node_level = levels.get(&node).copied().unwrap_or(0);
        max_level = max_level.max(node_level);

        for child in graph.children_of(&node) {
            let child_level = levels.entry(*child).or_insert(0);
            *child_level = (*child_level).max(node_level + 1);

            let Some(degree) = in_degree.get_mut(child) else {
                continue;
            };
            *degree = degree.saturating_sub(1);
            if *degree == 0 {
                queue.push_back(*child);
            }
        }
    }

    // 4. Cycle detection: unprocessed nodes never reached zero in-degree
    if processed < nodes.len() {
        let residual: Vec<&BatchTransaction> = nodes
            .iter()
            .copied()
            .filter(|tx| in_degree.get(&tx.hash()).is_some_and(|d| *d > 0))
            .collect();
        if let Some(start) = residual.first() {
            let member = find_cycle_member(graph, &in_degree, start.hash());
            debug!(
                unleveled = residual.len(),
                member = ?member,
                "Dependency cycle detected"
            );
            return Err(SchedulingError::CycleDetected { member });
        }
    }

    // 5. Materialize buckets
    let mut buckets: Vec<Vec<BatchTransaction>> = vec![Vec::new(); max_level as usize + 1];
    for tx in &nodes {
        let level = levels.get(&tx.hash()).copied().unwrap_or(0);
        buckets[level as usize].push((*tx).clone());
    }

    debug!(tx_count = nodes.len(), max_level, "Levels assigned");

    Ok(LevelMap::from_buckets(buckets))
}

/// Reject the batch on the first unusable external parent.
///
/// `NotFound` wins over `PendingElsewhere`: an invalid spend is reported even
/// when another transaction merely waits on an unconfirmed parent.
fn check_external_parents(
    graph: &DependencyGraph,
    statuses: &ExternalStatuses,
    nodes: &[&BatchTransaction],
    policy: PendingParentPolicy,
) -> Result<(), SchedulingError> {
    let mut first_pending: Option<(Hash, Hash)> = None;

    for tx in nodes {
        for reference in graph.external_refs_of(&tx.hash()) {
            match statuses.status_of(&reference.parent) {
                ExternalStatus::Confirmed => {}
                ExternalStatus::NotFound => {
                    return Err(SchedulingError::ExternalParentNotFound {
                        tx: reference.child,
                        parent: reference.parent,
                    });
                }
                ExternalStatus::PendingElsewhere => {
                    first_pending.get_or_insert((reference.child, reference.parent));
                }
            }
        }
    }

    match first_pending {
        Some((tx, parent)) => Err(SchedulingError::ExternalParentPending {
            tx,
            parent,
            retryable: policy == PendingParentPolicy::Retry,
        }),
        None => Ok(()),
    }
}

/// Walk unprocessed parents from `start` until a node repeats.
///
/// Every unprocessed node has at least one unprocessed parent, so the walk
/// always ends on a node that lies on a cycle.
fn find_cycle_member(
    graph: &DependencyGraph,
    in_degree: &HashMap<Hash, usize>,
    start: Hash,
) -> Hash {
    let mut visited: HashSet<Hash> = HashSet::new();
    let mut current = start;

    loop {
        if !visited.insert(current) {
            return current;
        }

        let next = graph
            .parents_of(&current)
            .iter()
            .filter(|parent| in_degree.get(*parent).is_some_and(|d| *d > 0))
            .filter_map(|parent| graph.transactions.get(parent))
            .min_by_key(|tx| tx.sort_key());

        match next {
            Some(parent) => current = parent.hash(),
            None => return current,
        }
    }
}
