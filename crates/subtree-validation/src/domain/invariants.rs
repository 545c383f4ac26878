//! Domain invariants for Subtree Validation
//!
//! Checked by the service in debug builds and by the test suites.

use super::entities::{DependencyGraph, ExternalStatuses, LevelMap};
use super::value_objects::Hash;
use std::collections::{HashMap, HashSet, VecDeque};

/// INVARIANT-1: Strict Level Ordering
/// For every in-batch edge child -> parent, level(child) > level(parent).
pub fn invariant_strict_level_ordering(map: &LevelMap, graph: &DependencyGraph) -> bool {
    for (child, parents) in &graph.parents {
        let Some(child_level) = map.level_of(child) else {
            return false;
        };
        for parent in parents {
            match map.level_of(parent) {
                Some(parent_level) if child_level > parent_level => {}
                _ => return false,
            }
        }
    }

    true
}

/// INVARIANT-2: Level-0 Correctness
/// A transaction sits at level 0 iff it has no in-batch parent and every
/// external reference is confirmed.
pub fn invariant_level_zero(
    map: &LevelMap,
    graph: &DependencyGraph,
    statuses: &ExternalStatuses,
) -> bool {
    graph.transactions.keys().all(|hash| {
        let eligible = graph.parents_of(hash).is_empty()
            && graph
                .external_refs_of(hash)
                .iter()
                .all(|r| statuses.status_of(&r.parent).is_confirmed());
        (map.level_of(hash) == Some(0)) == eligible
    })
}

/// INVARIANT-3: Partition
/// Every batch transaction appears in exactly one level; nothing else does.
pub fn invariant_partition(map: &LevelMap, graph: &DependencyGraph) -> bool {
    let mut seen: HashSet<Hash> = HashSet::new();

    for level in map.levels() {
        for tx in &level.transactions {
            if !seen.insert(tx.hash()) {
                return false;
            }
        }
    }

    let all_tx: HashSet<Hash> = graph.transactions.keys().copied().collect();

    seen == all_tx
}

/// INVARIANT-4: No Cycles
/// The in-batch graph must be a DAG. Iterative so long chains cannot
/// exhaust the stack.
pub fn invariant_no_cycles(graph: &DependencyGraph) -> bool {
    let mut in_degree: HashMap<Hash, usize> = graph
        .transactions
        .keys()
        .map(|hash| (*hash, graph.parents_of(hash).len()))
        .collect();

    let mut queue: VecDeque<Hash> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(hash, _)| *hash)
        .collect();

    let mut visited = 0;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        for child in graph.children_of(&node) {
            let Some(degree) = in_degree.get_mut(child) else {
                continue;
            };
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(*child);
            }
        }
    }

    visited == graph.node_count()
}
