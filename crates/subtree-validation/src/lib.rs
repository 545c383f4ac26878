//! # Subtree Validation: Dependency-Level Scheduling
//!
//! Computes a safe, maximally parallel validation order for a batch of
//! interdependent transactions ("subtree") and drives validation level by level.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (BatchTransaction, DependencyGraph, LevelMap), errors, invariants
//! - **Algorithms**: Dependency graph builder, external parent resolver, level assigner
//! - **Ports**: Inbound (SubtreeValidationApi) and Outbound (TransactionStatusStore, TransactionValidator)
//! - **Application**: Service orchestration and the level executor
//! - **Adapters**: In-memory ledger and closure-backed validator
//!
//! ## Levels
//!
//! A transaction's level is one more than the highest level of any in-batch
//! parent it spends. Level 0 holds only transactions whose every external
//! parent is confirmed. Transactions spending an unknown or unconfirmed
//! external parent are never leveled; the whole batch is rejected instead.

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{FnValidator, InMemoryLedger};
pub use application::{LevelExecutor, SubtreeValidationService};
pub use config::SchedulerConfig;
pub use domain::entities::*;
pub use domain::errors::{
    ConfigError, SchedulingError, StatusQueryError, TransactionFailure, ValidationError,
};
pub use domain::value_objects::*;
pub use ports::inbound::SubtreeValidationApi;
pub use ports::outbound::{TransactionStatusStore, TransactionValidator, ValidationContext};
pub use tokio_util::sync::CancellationToken;
