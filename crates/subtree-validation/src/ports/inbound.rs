//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{
    BatchTransaction, DependencyGraph, ExecutionReport, ExternalStatuses, LevelMap,
};
use crate::domain::errors::SchedulingError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Primary Subtree Validation API
#[async_trait]
pub trait SubtreeValidationApi: Send + Sync {
    /// Compute the level map for a batch.
    ///
    /// This is the scheduling entry point. It:
    /// 1. Builds the in-batch dependency graph
    /// 2. Resolves the status of external parents
    /// 3. Assigns levels
    ///
    /// No partial level map is ever returned.
    async fn prepare_levels(
        &self,
        batch: Vec<BatchTransaction>,
        cancel: &CancellationToken,
    ) -> Result<LevelMap, SchedulingError>;

    /// Schedule the batch and validate it level by level.
    async fn validate_subtree(
        &self,
        batch: Vec<BatchTransaction>,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport, SchedulingError>;

    /// Build the dependency graph for a batch.
    ///
    /// Pure function; fails only on duplicate identifiers or size limits.
    fn build_dependency_graph(
        &self,
        batch: Vec<BatchTransaction>,
    ) -> Result<DependencyGraph, SchedulingError>;

    /// Assign levels from a graph and a status snapshot.
    fn assign_levels(
        &self,
        graph: &DependencyGraph,
        statuses: &ExternalStatuses,
    ) -> Result<LevelMap, SchedulingError>;
}
