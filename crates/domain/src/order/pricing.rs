//! Shipping cost policy and order totals.

use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// Flat shipping fee charged below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Money = Money::from_units(10);

/// Subtotal from which shipping is free (inclusive).
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_units(50_000);

/// Computes the shipping cost for a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub flat_fee: Money,
    pub free_shipping_threshold: Money,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            flat_fee: FLAT_SHIPPING_FEE,
            free_shipping_threshold: FREE_SHIPPING_THRESHOLD,
        }
    }
}

impl ShippingPolicy {
    /// Creates a policy from whole currency units.
    pub fn from_units(flat_fee: i64, free_shipping_threshold: i64) -> Self {
        Self {
            flat_fee: Money::from_units(flat_fee),
            free_shipping_threshold: Money::from_units(free_shipping_threshold),
        }
    }

    /// Returns the shipping cost for `subtotal`.
    pub fn shipping_cost(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_shipping_threshold {
            Money::zero()
        } else {
            self.flat_fee
        }
    }

    /// Returns the subtotal, shipping cost and total.
    pub fn summarize(&self, subtotal: Money) -> OrderSummary {
        let shipping_cost = self.shipping_cost(subtotal);
        OrderSummary {
            subtotal,
            shipping_cost,
            total: subtotal + shipping_cost,
        }
    }
}

/// Price breakdown returned with every checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
}
