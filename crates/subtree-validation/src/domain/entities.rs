//! Core entities for Subtree Validation

use super::value_objects::{ExternalStatus, Hash, OutPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Transaction input spending a previous output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Output being spent
    pub previous_output: OutPoint,
    /// Unlocking script (opaque to the scheduler)
    pub unlocking_script: Vec<u8>,
}

impl TxInput {
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            unlocking_script: Vec::new(),
        }
    }
}

/// Transaction output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in satoshis
    pub value: u64,
    /// Spending condition (opaque to the scheduler)
    pub locking_script: Vec<u8>,
}

/// Ledger transaction as delivered inside a subtree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier
    pub hash: Hash,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn new(hash: Hash) -> Self {
        Self {
            hash,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, previous_output: OutPoint) -> Self {
        self.inputs.push(TxInput::new(previous_output));
        self
    }

    pub fn with_output(mut self, value: u64, locking_script: Vec<u8>) -> Self {
        self.outputs.push(TxOutput {
            value,
            locking_script,
        });
        self
    }

    /// Output `vout` of this transaction as an outpoint
    pub fn outpoint(&self, vout: u32) -> OutPoint {
        OutPoint::new(self.hash, vout)
    }
}

/// A transaction together with its original position in the subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchTransaction {
    pub tx: Arc<Transaction>,
    /// Position in the subtree as supplied by the caller
    pub index: usize,
}

impl BatchTransaction {
    pub fn new(tx: Transaction, index: usize) -> Self {
        Self {
            tx: Arc::new(tx),
            index,
        }
    }

    pub fn hash(&self) -> Hash {
        self.tx.hash
    }

    /// Deterministic ordering key: original index first, identifier as tiebreak.
    pub fn sort_key(&self) -> (usize, Hash) {
        (self.index, self.tx.hash)
    }
}

/// Input whose spent output belongs to a transaction outside the batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExternalReference {
    /// Spending transaction (inside the batch)
    pub child: Hash,
    /// Position of the input within `child`
    pub input_index: usize,
    /// Referenced transaction (outside the batch)
    pub parent: Hash,
}

/// In-batch spend dependency graph.
///
/// Edges always point child -> parent in `parents` and parent -> child in
/// `children`. Multiple inputs spending the same parent collapse into one edge.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// All batch transactions by hash
    pub transactions: HashMap<Hash, BatchTransaction>,
    /// child -> in-batch parents
    pub parents: HashMap<Hash, Vec<Hash>>,
    /// parent -> in-batch children
    pub children: HashMap<Hash, Vec<Hash>>,
    /// child -> inputs referencing transactions outside the batch
    pub external_refs: HashMap<Hash, Vec<ExternalReference>>,
    /// Distinct externally referenced identifiers
    pub external_parents: BTreeSet<Hash>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transaction node. Returns `false` if the hash is already present.
    pub fn add_node(&mut self, tx: BatchTransaction) -> bool {
        let hash = tx.hash();
        if self.transactions.contains_key(&hash) {
            return false;
        }
        self.transactions.insert(hash, tx);
        self.parents.entry(hash).or_default();
        self.children.entry(hash).or_default();
        true
    }

    /// Add a child -> parent edge. Returns `false` if the edge already exists.
    pub fn add_edge(&mut self, child: Hash, parent: Hash) -> bool {
        let parents = self.parents.entry(child).or_default();
        if parents.contains(&parent) {
            return false;
        }
        parents.push(parent);
        self.children.entry(parent).or_default().push(child);
        self.edge_count += 1;
        true
    }

    pub fn add_external_reference(&mut self, reference: ExternalReference) {
        self.external_parents.insert(reference.parent);
        self.external_refs
            .entry(reference.child)
            .or_default()
            .push(reference);
    }

    /// Check if `child` spends an output of `parent`
    pub fn has_edge(&self, child: &Hash, parent: &Hash) -> bool {
        self.parents
            .get(child)
            .map(|parents| parents.contains(parent))
            .unwrap_or(false)
    }

    pub fn parents_of(&self, hash: &Hash) -> &[Hash] {
        self.parents.get(hash).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children_of(&self, hash: &Hash) -> &[Hash] {
        self.children.get(hash).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn external_refs_of(&self, hash: &Hash) -> &[ExternalReference] {
        self.external_refs
            .get(hash)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes sorted by original index, independent of hash map iteration order.
    pub fn ordered_nodes(&self) -> Vec<&BatchTransaction> {
        let mut nodes: Vec<_> = self.transactions.values().collect();
        nodes.sort_by_key(|tx| tx.sort_key());
        nodes
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.transactions.len()
    }

    /// Number of in-batch edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Request-scoped snapshot of external parent statuses.
///
/// Filled once by the resolver and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalStatuses {
    statuses: HashMap<Hash, ExternalStatus>,
}

impl ExternalStatuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: Hash, status: ExternalStatus) {
        self.statuses.insert(hash, status);
    }

    /// Status of `hash`. Identifiers the store did not report are `NotFound`.
    pub fn status_of(&self, hash: &Hash) -> ExternalStatus {
        self.statuses
            .get(hash)
            .copied()
            .unwrap_or(ExternalStatus::NotFound)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.statuses.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl FromIterator<(Hash, ExternalStatus)> for ExternalStatuses {
    fn from_iter<I: IntoIterator<Item = (Hash, ExternalStatus)>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().collect(),
        }
    }
}

/// Transactions sharing one scheduling level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub level: u32,
    /// Ordered by original index
    pub transactions: Vec<BatchTransaction>,
}

impl Level {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn hashes(&self) -> Vec<Hash> {
        self.transactions.iter().map(BatchTransaction::hash).collect()
    }
}

/// Partition of a batch into levels `0..=max_level`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMap {
    levels: Vec<Level>,
    level_index: HashMap<Hash, u32>,
}

impl LevelMap {
    /// Build from per-level buckets; each bucket is sorted by original index.
    pub fn from_buckets(buckets: Vec<Vec<BatchTransaction>>) -> Self {
        let mut level_index = HashMap::new();
        let levels = buckets
            .into_iter()
            .enumerate()
            .map(|(level, mut transactions)| {
                let level = level as u32;
                transactions.sort_by_key(|tx| tx.sort_key());
                for tx in &transactions {
                    level_index.insert(tx.hash(), level);
                }
                Level {
                    level,
                    transactions,
                }
            })
            .collect();

        Self {
            levels,
            level_index,
        }
    }

    /// Highest assigned level; `0` for an empty map.
    pub fn max_level(&self) -> u32 {
        self.levels.len().saturating_sub(1) as u32
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn get(&self, level: u32) -> Option<&Level> {
        self.levels.get(level as usize)
    }

    pub fn level_of(&self, hash: &Hash) -> Option<u32> {
        self.level_index.get(hash).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn total_transactions(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    /// Size of the widest level
    pub fn max_parallelism(&self) -> usize {
        self.levels.iter().map(Level::len).max().unwrap_or(0)
    }

    /// Hashes in level order
    pub fn flatten(&self) -> Vec<Hash> {
        self.levels.iter().flat_map(Level::hashes).collect()
    }
}

/// Per-transaction lifecycle inside one validation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Leveled(u32),
    Running(u32),
    Completed,
    Failed,
}

/// Outcome of a fully executed level map
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Number of levels executed
    pub levels_executed: usize,
    /// Transactions validated per level
    pub validated_per_level: Vec<usize>,
    /// Final state of every transaction
    pub states: HashMap<Hash, TransactionState>,
}

impl ExecutionReport {
    pub fn validated(&self) -> usize {
        self.validated_per_level.iter().sum()
    }

    pub fn state_of(&self, hash: &Hash) -> Option<TransactionState> {
        self.states.get(hash).copied()
    }
}
