//! Configuration for Subtree Validation

use crate::domain::errors::ConfigError;
use crate::domain::value_objects::{FailurePolicy, PendingParentPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum transactions per subtree (anti-DoS)
    pub max_batch_size: usize,
    /// Maximum in-batch edges (anti-DoS)
    pub max_edge_count: usize,
    /// Concurrent validations within one level
    pub max_concurrency: usize,
    /// Bound on the whole external status query
    pub status_query_timeout_ms: u64,
    /// Identifiers per store call
    pub status_query_chunk_size: usize,
    /// Handling of parents pending in another subtree
    pub pending_parent_policy: PendingParentPolicy,
    /// Handling of in-flight work once a level has failed
    pub failure_policy: FailurePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1_000_000,
            max_edge_count: 10_000_000,
            max_concurrency: 32,
            status_query_timeout_ms: 30_000,
            status_query_chunk_size: 4_096,
            pending_parent_policy: PendingParentPolicy::Retry,
            failure_policy: FailurePolicy::FinishLevel,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::MustBePositive {
                field: "max_concurrency",
            });
        }
        if self.status_query_chunk_size == 0 {
            return Err(ConfigError::MustBePositive {
                field: "status_query_chunk_size",
            });
        }
        if self.status_query_timeout_ms == 0 {
            return Err(ConfigError::MustBePositive {
                field: "status_query_timeout_ms",
            });
        }
        Ok(())
    }

    pub fn status_query_timeout(&self) -> Duration {
        Duration::from_millis(self.status_query_timeout_ms)
    }
}
