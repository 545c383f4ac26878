//! Value objects for Subtree Validation

use primitive_types::H256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier
pub type Hash = H256;

/// Reference to a single output of a previous transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Identifier of the transaction that produced the output
    pub txid: Hash,
    /// Output index within that transaction
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.txid, self.vout)
    }
}

/// Validation status of a transaction that lives outside the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalStatus {
    /// Validated and durable; safe to spend from level 0.
    Confirmed,
    /// Unknown to the store. Spending it is invalid.
    NotFound,
    /// Known but not yet confirmed (e.g. part of another in-flight subtree).
    PendingElsewhere,
}

impl ExternalStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ExternalStatus::Confirmed)
    }
}

/// What to do with a transaction whose external parent is `PendingElsewhere`.
///
/// Such a transaction is never assigned a level. The policy only decides how the
/// caller should treat the rejection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingParentPolicy {
    /// Reject the batch as retryable; a later attempt may find the parent confirmed.
    #[default]
    Retry,
    /// Reject the batch as invalid.
    Reject,
}

/// Behaviour of the executor for work already dispatched when a level fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Let every dispatched validation in the failing level run to completion.
    #[default]
    FinishLevel,
    /// Cancel the remaining validations of the failing level.
    CancelLevel,
}
