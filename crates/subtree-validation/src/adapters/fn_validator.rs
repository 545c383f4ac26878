//! Closure-backed validator adapter

use crate::domain::entities::BatchTransaction;
use crate::domain::errors::ValidationError;
use crate::ports::outbound::{TransactionValidator, ValidationContext};
use async_trait::async_trait;

/// Wraps a synchronous check as a `TransactionValidator`.
///
/// Useful for embedding stateless script or policy checks.
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&BatchTransaction) -> Result<(), ValidationError> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<F> TransactionValidator for FnValidator<F>
where
    F: Fn(&BatchTransaction) -> Result<(), ValidationError> + Send + Sync,
{
    async fn validate(
        &self,
        tx: &BatchTransaction,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        if ctx.cancel.is_cancelled() {
            return Err(ValidationError::Cancelled);
        }
        (self.check)(tx)
    }
}
