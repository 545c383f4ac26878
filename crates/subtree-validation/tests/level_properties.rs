//! Property tests for level assignment over random batches

use primitive_types::H256;
use proptest::prelude::*;
use std::collections::HashSet;
use subtree_validation::algorithms::{assign_levels, build_dependency_graph};
use subtree_validation::domain::invariants::{
    invariant_level_zero, invariant_no_cycles, invariant_partition,
    invariant_strict_level_ordering,
};
use subtree_validation::{
    BatchTransaction, ExternalStatus, ExternalStatuses, Hash, LevelMap, OutPoint,
    PendingParentPolicy, SchedulingError, Transaction,
};

const MAX_TXS: usize = 24;

fn make_hash(id: u64) -> Hash {
    H256::from_low_u64_be(id)
}

fn external_hash(i: usize) -> Hash {
    make_hash(10_000 + i as u64)
}

/// Transaction `i` of a batch of `n`: one external confirmed input, one input
/// per chosen earlier transaction, and one output per possible child.
fn dag_tx(i: usize, n: usize, spends: &[bool]) -> Transaction {
    let tx = Transaction::new(make_hash(i as u64 + 1))
        .with_input(OutPoint::new(external_hash(i), 0));
    let tx = (0..i)
        .filter(|j| spends[*j])
        .fold(tx, |tx, j| {
            tx.with_input(OutPoint::new(make_hash(j as u64 + 1), i as u32))
        });
    (0..n).fold(tx, |tx, _| tx.with_output(1, vec![]))
}

fn dag_batch(n: usize, edges: &[Vec<bool>], order: &[usize]) -> Vec<BatchTransaction> {
    order
        .iter()
        .enumerate()
        .map(|(index, i)| BatchTransaction::new(dag_tx(*i, n, &edges[*i]), index))
        .collect()
}

fn confirmed_externals(n: usize) -> ExternalStatuses {
    (0..n)
        .map(|i| (external_hash(i), ExternalStatus::Confirmed))
        .collect()
}

fn level_all(batch: Vec<BatchTransaction>, n: usize) -> LevelMap {
    let graph = build_dependency_graph(batch);
    assign_levels(&graph, &confirmed_externals(n), PendingParentPolicy::Retry)
        .expect("acyclic batch with confirmed parents levels")
}

/// Random DAG: size, lower-triangular adjacency, and a shuffled input order
fn arb_dag() -> impl Strategy<Value = (usize, Vec<Vec<bool>>, Vec<usize>)> {
    (1..=MAX_TXS).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(prop::collection::vec(prop::bool::weighted(0.3), n), n),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        )
    })
}

proptest! {
    #[test]
    fn levels_respect_every_edge((n, edges, _order) in arb_dag()) {
        let order: Vec<usize> = (0..n).collect();
        let batch = dag_batch(n, &edges, &order);
        let graph = build_dependency_graph(batch.clone());
        let statuses = confirmed_externals(n);
        let map = assign_levels(&graph, &statuses, PendingParentPolicy::Retry).unwrap();

        prop_assert!(invariant_strict_level_ordering(&map, &graph));
        prop_assert!(invariant_partition(&map, &graph));
        prop_assert!(invariant_level_zero(&map, &graph, &statuses));
        prop_assert!(invariant_no_cycles(&graph));
        prop_assert_eq!(map.total_transactions(), n);
    }

    #[test]
    fn level_is_longest_in_batch_path((n, edges, _order) in arb_dag()) {
        let order: Vec<usize> = (0..n).collect();
        let map = level_all(dag_batch(n, &edges, &order), n);

        // Parents always precede children in 0..n, so one forward pass suffices
        let mut expected = vec![0u32; n];
        for i in 0..n {
            expected[i] = (0..i)
                .filter(|j| edges[i][*j])
                .map(|j| expected[j] + 1)
                .max()
                .unwrap_or(0);
        }

        for (i, level) in expected.iter().enumerate() {
            prop_assert_eq!(map.level_of(&make_hash(i as u64 + 1)), Some(*level));
        }
        prop_assert_eq!(map.max_level(), expected.iter().copied().max().unwrap_or(0));
    }

    #[test]
    fn input_order_does_not_change_levels((n, edges, order) in arb_dag()) {
        let sorted: Vec<usize> = (0..n).collect();
        let baseline = level_all(dag_batch(n, &edges, &sorted), n);
        let shuffled = level_all(dag_batch(n, &edges, &order), n);

        prop_assert_eq!(baseline.max_level(), shuffled.max_level());
        for level in baseline.levels() {
            let expected: HashSet<Hash> = level.hashes().into_iter().collect();
            let actual: HashSet<Hash> = shuffled
                .get(level.level)
                .map(|l| l.hashes().into_iter().collect())
                .unwrap_or_default();
            prop_assert_eq!(expected, actual);
        }
    }

    #[test]
    fn repeated_runs_are_identical((n, edges, order) in arb_dag()) {
        let first = level_all(dag_batch(n, &edges, &order), n);
        let second = level_all(dag_batch(n, &edges, &order), n);

        prop_assert_eq!(first.flatten(), second.flatten());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cycles_are_reported_with_a_member(
        ring in 1usize..8,
        tail in 0usize..8,
    ) {
        // Ring members spend their predecessor; the tail hangs off the ring
        let mut txs = Vec::new();
        for i in 0..ring {
            let prev = (i + ring - 1) % ring;
            txs.push(
                Transaction::new(make_hash(i as u64 + 1))
                    .with_input(OutPoint::new(make_hash(prev as u64 + 1), 0))
                    .with_output(1, vec![])
                    .with_output(1, vec![]),
            );
        }
        for t in 0..tail {
            let parent = if t == 0 { 1 } else { (ring + t) as u64 };
            let vout = if t == 0 { 1 } else { 0 };
            txs.push(
                Transaction::new(make_hash((ring + t + 1) as u64))
                    .with_input(OutPoint::new(make_hash(parent), vout))
                    .with_output(1, vec![]),
            );
        }

        let batch: Vec<BatchTransaction> = txs
            .into_iter()
            .enumerate()
            .map(|(index, tx)| BatchTransaction::new(tx, index))
            .collect();
        let graph = build_dependency_graph(batch);
        prop_assert!(!invariant_no_cycles(&graph));

        let ring_members: HashSet<Hash> =
            (0..ring).map(|i| make_hash(i as u64 + 1)).collect();
        match assign_levels(&graph, &ExternalStatuses::new(), PendingParentPolicy::Retry) {
            Err(SchedulingError::CycleDetected { member }) => {
                prop_assert!(ring_members.contains(&member));
            }
            other => prop_assert!(false, "expected CycleDetected, got {:?}", other),
        }
    }
}
