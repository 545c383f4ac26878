//! Dependency Graph Builder
//!
//! Splits every input of every batch transaction into either an in-batch
//! spend edge or an external reference.

use crate::domain::entities::{BatchTransaction, DependencyGraph, ExternalReference};

/// Build the spend dependency graph of a batch.
///
/// The hash index is built once over the whole batch, so membership tests are
/// O(1) and do not depend on the order in which transactions were supplied.
/// Identifiers are expected to be unique; a repeated identifier keeps its
/// first occurrence.
pub fn build_dependency_graph(batch: Vec<BatchTransaction>) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for tx in batch {
        graph.add_node(tx);
    }

    let ordered: Vec<BatchTransaction> = graph.ordered_nodes().into_iter().cloned().collect();

    for tx in &ordered {
        let child = tx.hash();
        for (input_index, input) in tx.tx.inputs.iter().enumerate() {
            let parent = input.previous_output.txid;
            if graph.transactions.contains_key(&parent) {
                graph.add_edge(child, parent);
            } else {
                graph.add_external_reference(ExternalReference {
                    child,
                    input_index,
                    parent,
                });
            }
        }
    }

    graph
}
