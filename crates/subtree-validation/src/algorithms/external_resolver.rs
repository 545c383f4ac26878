//! External Parent Resolver
//!
//! Classifies every transaction referenced from outside the batch through the
//! status store, in as few round-trips as the chunk size allows.

use crate::domain::entities::ExternalStatuses;
use crate::domain::errors::{SchedulingError, StatusQueryError};
use crate::domain::value_objects::{ExternalStatus, Hash};
use crate::ports::outbound::TransactionStatusStore;
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Resolves external parent identifiers into a status snapshot.
///
/// The snapshot lives for one request only; external chain state may change
/// between requests.
#[derive(Clone)]
pub struct ExternalParentResolver {
    store: Arc<dyn TransactionStatusStore>,
    chunk_size: usize,
    query_timeout: Duration,
}

impl ExternalParentResolver {
    pub fn new(
        store: Arc<dyn TransactionStatusStore>,
        chunk_size: usize,
        query_timeout: Duration,
    ) -> Self {
        Self {
            store,
            chunk_size: chunk_size.max(1),
            query_timeout,
        }
    }

    /// Query the status of every identifier in `parents`.
    ///
    /// Chunks are queried concurrently; the timeout bounds the whole lookup.
    /// A timeout or store failure yields `ExternalStatusQueryFailed`, never
    /// `NotFound`.
    pub async fn resolve(
        &self,
        parents: &BTreeSet<Hash>,
        cancel: &CancellationToken,
    ) -> Result<ExternalStatuses, SchedulingError> {
        if parents.is_empty() {
            return Ok(ExternalStatuses::new());
        }

        let hashes: Vec<Hash> = parents.iter().copied().collect();
        let chunk_count = hashes.len().div_ceil(self.chunk_size);

        debug!(
            external_parents = hashes.len(),
            chunks = chunk_count,
            "Resolving external parent statuses"
        );

        let queries = hashes
            .chunks(self.chunk_size)
            .map(|chunk| self.store.get_statuses(chunk));
        let lookup = timeout(self.query_timeout, try_join_all(queries));

        let responses = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SchedulingError::Cancelled),
            outcome = lookup => match outcome {
                Ok(Ok(responses)) => responses,
                Ok(Err(e)) => {
                    warn!(error = %e, "External status query failed");
                    return Err(SchedulingError::ExternalStatusQueryFailed(e));
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.query_timeout.as_millis() as u64,
                        "External status query timed out"
                    );
                    return Err(SchedulingError::ExternalStatusQueryFailed(
                        StatusQueryError::Timeout,
                    ));
                }
            },
        };

        let mut reported: HashMap<Hash, ExternalStatus> = HashMap::new();
        for response in responses {
            reported.extend(response);
        }

        let statuses: ExternalStatuses = hashes
            .iter()
            .map(|hash| {
                let status = reported
                    .get(hash)
                    .copied()
                    .unwrap_or(ExternalStatus::NotFound);
                (*hash, status)
            })
            .collect();

        let unreported = hashes
            .iter()
            .filter(|hash| !reported.contains_key(*hash))
            .count();
        debug!(
            resolved = statuses.len(),
            unreported,
            "External parent statuses resolved"
        );

        Ok(statuses)
    }
}
