//! Level Executor
//!
//! Runs validation level by level. All work of level `k` finishes (success,
//! failure or cancellation) before anything of level `k + 1` is dispatched.

use crate::domain::entities::{BatchTransaction, ExecutionReport, LevelMap, TransactionState};
use crate::domain::errors::{SchedulingError, TransactionFailure, ValidationError};
use crate::domain::value_objects::{FailurePolicy, Hash};
use crate::ports::outbound::{TransactionValidator, ValidationContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bounded, barrier-synchronized executor over a level map
#[derive(Clone)]
pub struct LevelExecutor {
    validator: Arc<dyn TransactionValidator>,
    max_concurrency: usize,
    failure_policy: FailurePolicy,
}

impl LevelExecutor {
    pub fn new(
        validator: Arc<dyn TransactionValidator>,
        max_concurrency: usize,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            validator,
            max_concurrency: max_concurrency.max(1),
            failure_policy,
        }
    }

    /// Validate every transaction of `map`, fail-fast per level.
    ///
    /// On failure, every failing transaction of the failing level is reported
    /// and no further level is dispatched. A cancelled request returns
    /// `Cancelled` and discards partial results.
    pub async fn execute(
        &self,
        map: &LevelMap,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport, SchedulingError> {
        let mut report = ExecutionReport::default();
        for level in map.levels() {
            for tx in &level.transactions {
                report
                    .states
                    .insert(tx.hash(), TransactionState::Leveled(level.level));
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        for level in map.levels() {
            if cancel.is_cancelled() {
                return Err(SchedulingError::Cancelled);
            }

            debug!(
                level = level.level,
                tx_count = level.len(),
                "Dispatching level"
            );

            let level_cancel = cancel.child_token();
            let mut outstanding: HashMap<Hash, &BatchTransaction> = HashMap::new();
            let mut tasks = JoinSet::new();

            for tx in &level.transactions {
                report
                    .states
                    .insert(tx.hash(), TransactionState::Running(level.level));
                outstanding.insert(tx.hash(), tx);

                let validator = Arc::clone(&self.validator);
                let semaphore = Arc::clone(&semaphore);
                let tx = tx.clone();
                let ctx = ValidationContext {
                    level: level.level,
                    cancel: level_cancel.clone(),
                };

                tasks.spawn(async move {
                    let outcome = tokio::select! {
                        biased;
                        _ = ctx.cancel.cancelled() => Err(ValidationError::Cancelled),
                        result = async {
                            match semaphore.acquire_owned().await {
                                Ok(_permit) => validator.validate(&tx, &ctx).await,
                                Err(_) => Err(ValidationError::Internal(
                                    "worker pool closed".into(),
                                )),
                            }
                        } => result,
                    };
                    (tx.hash(), outcome)
                });
            }

            // Barrier: drain the whole level before looking at the next one
            let mut failures: Vec<TransactionFailure> = Vec::new();
            let mut validated = 0;

            while let Some(joined) = tasks.join_next().await {
                let (hash, outcome) = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(level = level.level, error = %e, "Validation task aborted");
                        continue;
                    }
                };
                let Some(tx) = outstanding.remove(&hash) else {
                    continue;
                };

                match outcome {
                    Ok(()) => {
                        validated += 1;
                        report.states.insert(hash, TransactionState::Completed);
                    }
                    Err(ValidationError::Cancelled) if level_cancel.is_cancelled() => {
                        report.states.insert(hash, TransactionState::Failed);
                    }
                    Err(error) => {
                        report.states.insert(hash, TransactionState::Failed);
                        if failures.is_empty() && self.failure_policy == FailurePolicy::CancelLevel
                        {
                            level_cancel.cancel();
                        }
                        failures.push(TransactionFailure {
                            tx: hash,
                            index: tx.index,
                            error,
                        });
                    }
                }
            }

            // Tasks that panicked never reported back
            for (hash, tx) in outstanding {
                report.states.insert(hash, TransactionState::Failed);
                failures.push(TransactionFailure {
                    tx: hash,
                    index: tx.index,
                    error: ValidationError::Internal("validation task panicked".into()),
                });
            }

            if cancel.is_cancelled() {
                warn!(level = level.level, "Subtree validation cancelled");
                return Err(SchedulingError::Cancelled);
            }

            if !failures.is_empty() {
                failures.sort_by_key(|failure| (failure.index, failure.tx));
                warn!(
                    level = level.level,
                    failed = failures.len(),
                    validated,
                    "Level failed validation"
                );
                return Err(SchedulingError::ValidationFailed {
                    level: level.level,
                    failures,
                });
            }

            report.validated_per_level.push(validated);
            report.levels_executed += 1;
        }

        Ok(report)
    }
}
