//! Checkout inputs and outputs.

use common::UserId;
use domain::{DraftLine, Order, OrderDetails, OrderDraft, OrderSummary, Tracking};
use serde::{Deserialize, Serialize};

/// Direct checkout of an explicit product list.
///
/// Every field defaults when absent so that missing input surfaces as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    pub user_id: Option<UserId>,
    pub products: Vec<DraftLine>,
    pub shipping_address: String,
    pub payment_method: String,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn new(
        user_id: UserId,
        products: Vec<DraftLine>,
        shipping_address: impl Into<String>,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            products,
            shipping_address: shipping_address.into(),
            payment_method: payment_method.into(),
            shipping_method: None,
            notes: None,
        }
    }

    pub fn into_draft(self) -> OrderDraft {
        OrderDraft {
            user_id: self.user_id,
            lines: self.products,
            details: OrderDetails {
                shipping_address: self.shipping_address,
                payment_method: self.payment_method,
                shipping_method: self.shipping_method,
                notes: self.notes,
            },
        }
    }
}

/// Checkout of the user's active cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CartCheckout {
    pub shipping_address: String,
    pub payment_method: String,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
}

impl CartCheckout {
    pub fn new(shipping_address: impl Into<String>, payment_method: impl Into<String>) -> Self {
        Self {
            shipping_address: shipping_address.into(),
            payment_method: payment_method.into(),
            ..Self::default()
        }
    }

    pub fn into_details(self) -> OrderDetails {
        OrderDetails {
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            shipping_method: self.shipping_method,
            notes: self.notes,
        }
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub summary: OrderSummary,
    pub tracking: Tracking,
}
