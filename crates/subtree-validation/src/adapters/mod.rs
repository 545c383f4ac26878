//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the outbound port traits.

mod fn_validator;
mod memory_ledger;

pub use fn_validator::FnValidator;
pub use memory_ledger::InMemoryLedger;
