//! Checkout orchestration.
//!
//! A checkout turns a product list or a user's cart into a persisted order.
//! It runs as a journaled unit of work:
//! 1. Create the order
//! 2. Decrement stock for every line
//! 3. Mark the cart checked out (cart checkouts only)
//! 4. Initialize shipment tracking
//!
//! If any step fails, previously completed steps are compensated in reverse order.

pub mod coordinator;
pub mod error;
pub mod journal;
pub mod request;
pub mod state;

pub use coordinator::CheckoutCoordinator;
pub use error::CheckoutError;
pub use journal::{CheckoutJournal, CompletedAction};
pub use request::{CartCheckout, CheckoutReceipt, CheckoutRequest};
pub use state::{CheckoutState, CheckoutStep};
