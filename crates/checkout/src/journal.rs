//! In-flight record of a checkout.
//!
//! The journal tracks which steps completed so that a failure can undo them
//! in reverse order.

use common::OrderId;
use domain::{Cart, ProductId};

use crate::state::{CheckoutState, CheckoutStep};

/// A completed side effect that compensation must undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletedAction {
    OrderCreated { order_id: OrderId },
    StockDecremented { product_id: ProductId, quantity: i64 },
    /// The cart as it was before it was emptied.
    CartCompleted { snapshot: Cart },
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutJournal {
    state: CheckoutState,
    current_step: Option<CheckoutStep>,
    failed_step: Option<CheckoutStep>,
    completed: Vec<CompletedAction>,
}

impl CheckoutJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn current_step(&self) -> Option<CheckoutStep> {
        self.current_step
    }

    pub fn failed_step(&self) -> Option<CheckoutStep> {
        self.failed_step
    }

    /// Completed actions in the order they happened.
    pub fn completed(&self) -> &[CompletedAction] {
        &self.completed
    }

    /// Marks a step as running. The first call moves the journal to `Running`.
    pub fn start(&mut self, step: CheckoutStep) {
        if self.state.can_run() {
            self.state = CheckoutState::Running;
        }
        tracing::info!(step = step.as_str(), "checkout step started");
        self.current_step = Some(step);
    }

    pub fn record(&mut self, action: CompletedAction) {
        self.completed.push(action);
    }

    /// Records the failing step and switches to compensation.
    ///
    /// Returns the completed actions, most recent first.
    pub fn begin_compensation(&mut self, step: CheckoutStep) -> Vec<CompletedAction> {
        self.failed_step = Some(step);
        if self.state.can_compensate() {
            self.state = CheckoutState::Compensating;
        }
        self.completed.iter().rev().cloned().collect()
    }

    /// Finishes compensation.
    pub fn fail(&mut self) {
        self.state = CheckoutState::Failed;
        self.current_step = None;
    }

    pub fn complete(&mut self) {
        self.state = CheckoutState::Completed;
        self.current_step = None;
    }
}
