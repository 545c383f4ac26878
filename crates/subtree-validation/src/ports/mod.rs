//! Ports module for Subtree Validation
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::SubtreeValidationApi;
pub use outbound::{TransactionStatusStore, TransactionValidator, ValidationContext};
