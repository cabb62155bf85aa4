//! Checkout error types.

use domain::DomainError;
use thiserror::Error;

use crate::state::CheckoutStep;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input or cart validation failed before anything was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A unit-of-work step failed; completed steps were compensated.
    #[error("Checkout step '{step}' failed: {source}")]
    StepFailed {
        step: CheckoutStep,
        #[source]
        source: DomainError,
    },
}

impl CheckoutError {
    /// Returns the underlying domain error, whichever phase produced it.
    pub fn domain_error(&self) -> &DomainError {
        match self {
            CheckoutError::Domain(e) => e,
            CheckoutError::StepFailed { source, .. } => source,
        }
    }

    /// Returns the failed step, if the unit of work had started.
    pub fn failed_step(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutError::Domain(_) => None,
            CheckoutError::StepFailed { step, .. } => Some(*step),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
