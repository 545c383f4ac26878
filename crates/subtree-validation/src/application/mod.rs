//! Application layer: request orchestration and level execution

pub mod executor;
pub mod service;

pub use executor::LevelExecutor;
pub use service::SubtreeValidationService;
