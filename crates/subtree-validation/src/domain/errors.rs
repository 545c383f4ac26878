//! Error types for Subtree Validation

use super::value_objects::{Hash, OutPoint};
use thiserror::Error;

/// All errors that can occur while scheduling and executing a subtree
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// A referenced output was never produced. The batch is invalid.
    #[error("External parent {parent:?} of transaction {tx:?} not found")]
    ExternalParentNotFound { tx: Hash, parent: Hash },

    /// A referenced parent exists but is not yet confirmed.
    #[error("External parent {parent:?} of transaction {tx:?} is pending elsewhere")]
    ExternalParentPending {
        tx: Hash,
        parent: Hash,
        retryable: bool,
    },

    /// Status of external parents could not be determined
    #[error("External status query failed: {0}")]
    ExternalStatusQueryFailed(#[from] StatusQueryError),

    /// Cycle detected among in-batch spends
    #[error("Cycle detected in dependency graph at transaction {member:?}")]
    CycleDetected { member: Hash },

    /// One or more transactions of a level failed validation
    #[error("{} transaction(s) failed validation at level {level}", .failures.len())]
    ValidationFailed {
        level: u32,
        failures: Vec<TransactionFailure>,
    },

    /// Request was cancelled by the caller
    #[error("Subtree validation cancelled")]
    Cancelled,

    /// Same transaction identifier supplied twice
    #[error("Duplicate transaction {hash:?} in batch")]
    DuplicateTransaction { hash: Hash },

    /// Batch size exceeded limits
    #[error("Batch size exceeded: {size} > {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Edge count exceeded limits (anti-DoS)
    #[error("Edge count exceeded: {count} > {max}")]
    TooManyEdges { count: usize, max: usize },
}

impl SchedulingError {
    /// Whether the caller may retry the same batch later.
    pub fn is_retryable(&self) -> bool {
        match self {
            SchedulingError::ExternalStatusQueryFailed(_) | SchedulingError::Cancelled => true,
            SchedulingError::ExternalParentPending { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Transaction the error is attributed to, if any
    pub fn offending_transaction(&self) -> Option<Hash> {
        match self {
            SchedulingError::ExternalParentNotFound { tx, .. }
            | SchedulingError::ExternalParentPending { tx, .. } => Some(*tx),
            SchedulingError::CycleDetected { member } => Some(*member),
            SchedulingError::DuplicateTransaction { hash } => Some(*hash),
            SchedulingError::ValidationFailed { failures, .. } => {
                failures.first().map(|failure| failure.tx)
            }
            _ => None,
        }
    }
}

/// Validation failure of a single transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFailure {
    pub tx: Hash,
    /// Original index in the batch
    pub index: usize,
    pub error: ValidationError,
}

/// Error returned by the transaction status store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusQueryError {
    #[error("Timeout while querying transaction status")]
    Timeout,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

/// Error returned by the per-transaction validator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid transaction: {0}")]
    Invalid(String),

    #[error("Missing input {outpoint}")]
    MissingInput { outpoint: OutPoint },

    #[error("Validation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Invalid scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },
}
