//! In-memory ledger adapter
//!
//! Implements both outbound ports over one shared UTXO set: the status store
//! reads it, the validator spends from it and records validated outputs.

use crate::domain::entities::{BatchTransaction, Transaction};
use crate::domain::errors::{StatusQueryError, ValidationError};
use crate::domain::value_objects::{ExternalStatus, Hash, OutPoint};
use crate::ports::outbound::{TransactionStatusStore, TransactionValidator, ValidationContext};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct LedgerState {
    statuses: HashMap<Hash, ExternalStatus>,
    unspent: HashSet<OutPoint>,
}

/// Shared in-memory UTXO set.
///
/// A transaction validates only if every input it spends is unspent at the
/// moment of validation, so spending an in-batch parent that has not been
/// validated yet fails with `MissingInput`.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tx` as confirmed with all outputs unspent.
    pub async fn confirm(&self, tx: &Transaction) {
        let mut state = self.state.write().await;
        Self::record(&mut state, tx);
    }

    /// Record `hash` as known but unconfirmed.
    pub async fn mark_pending(&self, hash: Hash) {
        let mut state = self.state.write().await;
        state.statuses.insert(hash, ExternalStatus::PendingElsewhere);
    }

    pub async fn status(&self, hash: &Hash) -> Option<ExternalStatus> {
        self.state.read().await.statuses.get(hash).copied()
    }

    pub async fn is_unspent(&self, outpoint: &OutPoint) -> bool {
        self.state.read().await.unspent.contains(outpoint)
    }

    fn record(state: &mut LedgerState, tx: &Transaction) {
        state.statuses.insert(tx.hash, ExternalStatus::Confirmed);
        for vout in 0..tx.outputs.len() as u32 {
            state.unspent.insert(tx.outpoint(vout));
        }
    }
}

#[async_trait]
impl TransactionStatusStore for InMemoryLedger {
    async fn get_statuses(
        &self,
        hashes: &[Hash],
    ) -> Result<HashMap<Hash, ExternalStatus>, StatusQueryError> {
        let state = self.state.read().await;
        Ok(hashes
            .iter()
            .filter_map(|hash| state.statuses.get(hash).map(|status| (*hash, *status)))
            .collect())
    }
}

#[async_trait]
impl TransactionValidator for InMemoryLedger {
    async fn validate(
        &self,
        tx: &BatchTransaction,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        let mut state = self.state.write().await;

        // Check everything before spending anything
        if let Some(input) = tx
            .tx
            .inputs
            .iter()
            .find(|input| !state.unspent.contains(&input.previous_output))
        {
            return Err(ValidationError::MissingInput {
                outpoint: input.previous_output,
            });
        }

        for input in &tx.tx.inputs {
            state.unspent.remove(&input.previous_output);
        }
        Self::record(&mut state, &tx.tx);

        debug!(tx = ?tx.hash(), level = ctx.level, "Transaction recorded");
        Ok(())
    }
}
