//! Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the scheduler depends on but does not implement.

use crate::domain::entities::BatchTransaction;
use crate::domain::errors::{StatusQueryError, ValidationError};
use crate::domain::value_objects::{ExternalStatus, Hash};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Transaction status store
///
/// Classifies transactions outside the batch as confirmed, unknown, or pending.
#[async_trait]
pub trait TransactionStatusStore: Send + Sync {
    /// Look up the status of every identifier in one round-trip.
    ///
    /// Identifiers missing from the returned map are treated as `NotFound`.
    /// Transport failures must be returned as errors, never as `NotFound`.
    async fn get_statuses(
        &self,
        hashes: &[Hash],
    ) -> Result<HashMap<Hash, ExternalStatus>, StatusQueryError>;
}

/// Per-call context handed to the validator
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Level the transaction was scheduled at
    pub level: u32,
    /// Cancelled when the request is cancelled or the level is aborted
    pub cancel: CancellationToken,
}

/// Per-transaction validator
///
/// Invoked once per transaction. Recording the validated transaction is the
/// validator's concern.
#[async_trait]
pub trait TransactionValidator: Send + Sync {
    async fn validate(
        &self,
        tx: &BatchTransaction,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError>;
}
