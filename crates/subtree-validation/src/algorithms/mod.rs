//! Algorithms module for Subtree Validation
//!
//! Contains:
//! - Dependency graph builder
//! - External parent resolver
//! - Level assigner (Kahn's algorithm with longest-path levels)

pub mod dependency_builder;
pub mod external_resolver;
pub mod level_assigner;

pub use dependency_builder::build_dependency_graph;
pub use external_resolver::ExternalParentResolver;
pub use level_assigner::assign_levels;
