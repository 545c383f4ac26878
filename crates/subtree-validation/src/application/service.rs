//! Subtree Validation Service
//!
//! Main service implementing SubtreeValidationApi.

use crate::algorithms::{assign_levels, build_dependency_graph, ExternalParentResolver};
use crate::application::executor::LevelExecutor;
use crate::config::SchedulerConfig;
use crate::domain::entities::{
    BatchTransaction, DependencyGraph, ExecutionReport, ExternalStatuses, LevelMap,
};
use crate::domain::errors::{ConfigError, SchedulingError};
use crate::domain::invariants::{
    invariant_level_zero, invariant_partition, invariant_strict_level_ordering,
};
use crate::ports::inbound::SubtreeValidationApi;
use crate::ports::outbound::{TransactionStatusStore, TransactionValidator};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Subtree Validation Service
///
/// Orchestrates the scheduling pipeline:
/// 1. Validate input
/// 2. Build dependency graph
/// 3. Resolve external parents
/// 4. Assign levels
/// 5. Execute validation level by level
///
/// Holds only read-only configuration and its collaborators; every request
/// computes its graph, statuses and levels from scratch.
pub struct SubtreeValidationService {
    config: SchedulerConfig,
    resolver: ExternalParentResolver,
    executor: LevelExecutor,
}

impl SubtreeValidationService {
    /// Create a new service with default config
    pub fn new(
        store: Arc<dyn TransactionStatusStore>,
        validator: Arc<dyn TransactionValidator>,
    ) -> Self {
        Self::build(SchedulerConfig::default(), store, validator)
    }

    /// Create a new service with custom config
    pub fn with_config(
        config: SchedulerConfig,
        store: Arc<dyn TransactionStatusStore>,
        validator: Arc<dyn TransactionValidator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, store, validator))
    }

    fn build(
        config: SchedulerConfig,
        store: Arc<dyn TransactionStatusStore>,
        validator: Arc<dyn TransactionValidator>,
    ) -> Self {
        let resolver = ExternalParentResolver::new(
            store,
            config.status_query_chunk_size,
            config.status_query_timeout(),
        );
        let executor = LevelExecutor::new(validator, config.max_concurrency, config.failure_policy);

        Self {
            config,
            resolver,
            executor,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate batch size and identifier uniqueness
    fn validate_batch(&self, batch: &[BatchTransaction]) -> Result<(), SchedulingError> {
        if batch.len() > self.config.max_batch_size {
            return Err(SchedulingError::BatchTooLarge {
                size: batch.len(),
                max: self.config.max_batch_size,
            });
        }

        let mut seen = HashSet::with_capacity(batch.len());
        for tx in batch {
            if !seen.insert(tx.hash()) {
                return Err(SchedulingError::DuplicateTransaction { hash: tx.hash() });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SubtreeValidationApi for SubtreeValidationService {
    async fn prepare_levels(
        &self,
        batch: Vec<BatchTransaction>,
        cancel: &CancellationToken,
    ) -> Result<LevelMap, SchedulingError> {
        info!(tx_count = batch.len(), "Preparing subtree levels");

        // 1-2. Validate input and build graph
        let graph = self.build_dependency_graph(batch)?;
        debug!(
            edges = graph.edge_count(),
            external_parents = graph.external_parents.len(),
            "Built dependency graph"
        );

        if cancel.is_cancelled() {
            return Err(SchedulingError::Cancelled);
        }

        // 3. Resolve external parents
        let statuses = self.resolver.resolve(&graph.external_parents, cancel).await?;

        // 4. Assign levels
        let map = match self.assign_levels(&graph, &statuses) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Subtree rejected");
                return Err(e);
            }
        };

        debug_assert!(invariant_partition(&map, &graph));
        debug_assert!(invariant_strict_level_ordering(&map, &graph));
        debug_assert!(invariant_level_zero(&map, &graph, &statuses));

        info!(
            max_level = map.max_level(),
            levels = map.levels().len(),
            max_parallelism = map.max_parallelism(),
            "Subtree levels prepared"
        );

        Ok(map)
    }

    async fn validate_subtree(
        &self,
        batch: Vec<BatchTransaction>,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport, SchedulingError> {
        let map = self.prepare_levels(batch, cancel).await?;

        let report = self.executor.execute(&map, cancel).await?;

        info!(
            validated = report.validated(),
            levels = report.levels_executed,
            "Subtree validated"
        );

        Ok(report)
    }

    fn build_dependency_graph(
        &self,
        batch: Vec<BatchTransaction>,
    ) -> Result<DependencyGraph, SchedulingError> {
        self.validate_batch(&batch)?;

        let graph = build_dependency_graph(batch);

        // Validate edge count
        if graph.edge_count() > self.config.max_edge_count {
            return Err(SchedulingError::TooManyEdges {
                count: graph.edge_count(),
                max: self.config.max_edge_count,
            });
        }

        Ok(graph)
    }

    fn assign_levels(
        &self,
        graph: &DependencyGraph,
        statuses: &ExternalStatuses,
    ) -> Result<LevelMap, SchedulingError> {
        assign_levels(graph, statuses, self.config.pending_parent_policy)
    }
}
