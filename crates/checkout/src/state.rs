//! Checkout state machine and steps.

use serde::{Deserialize, Serialize};

/// The state of a checkout in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    #[default]
    NotStarted,

    /// Steps are being executed.
    Running,

    /// A step failed and completed steps are being undone.
    Compensating,

    /// All steps completed (terminal state).
    Completed,

    /// Compensation finished after a failure (terminal state).
    Failed,
}

impl CheckoutState {
    pub fn can_run(&self) -> bool {
        matches!(self, CheckoutState::NotStarted)
    }

    pub fn can_compensate(&self) -> bool {
        matches!(self, CheckoutState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Completed | CheckoutState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::NotStarted => "NotStarted",
            CheckoutState::Running => "Running",
            CheckoutState::Compensating => "Compensating",
            CheckoutState::Completed => "Completed",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The steps of the checkout unit of work, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    CreateOrder,
    DecrementStock,
    CompleteCart,
    InitializeTracking,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::CreateOrder => "create_order",
            CheckoutStep::DecrementStock => "decrement_stock",
            CheckoutStep::CompleteCart => "complete_cart",
            CheckoutStep::InitializeTracking => "initialize_tracking",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
