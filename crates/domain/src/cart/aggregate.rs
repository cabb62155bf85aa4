//! Cart entity and its mutation rules.

use chrono::{DateTime, Duration, Utc};
use common::{CartId, UserId};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, ProductId};

use super::{CartError, CartItem, CartStatus, NewCartItem};

/// Sliding expiration window, restarted on every mutation.
pub const CART_TTL: Duration = Duration::hours(24);

/// A user's shopping cart.
///
/// Items keep insertion order and are unique by product. The total is always
/// derived from the items and never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    items: Vec<CartItem>,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: CartStatus,
}

// Query methods
impl Cart {
    /// Returns the cart ID.
    pub fn id(&self) -> CartId {
        self.id
    }

    /// Returns the owner.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the items in the order they were added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns an item by product ID.
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the derived total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> CartStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

// Mutation methods
impl Cart {
    /// Creates an empty active cart expiring `CART_TTL` after `now`.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            total_amount: Money::zero(),
            created_at: now,
            updated_at: now,
            expires_at: now + CART_TTL,
            status: CartStatus::Active,
        }
    }

    /// Flips an overdue active cart to `Expired` and fails.
    ///
    /// Must run before every read and mutation. An already expired cart keeps
    /// failing; a checked-out cart is frozen and never expires.
    pub fn check_expiration(&mut self, now: DateTime<Utc>) -> Result<(), CartError> {
        match self.status {
            CartStatus::Expired => Err(self.expired_error()),
            CartStatus::Active if now > self.expires_at => {
                self.status = CartStatus::Expired;
                Err(self.expired_error())
            }
            _ => Ok(()),
        }
    }

    /// Adds an item, merging quantities when the product is already present.
    ///
    /// The resulting quantity must not exceed `current_stock`. A merged line
    /// keeps the price captured when it was first added.
    pub fn add_item(
        &mut self,
        item: NewCartItem,
        current_stock: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        self.ensure_active(now)?;

        if item.quantity <= 0 {
            return Err(CartError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            let new_quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or(CartError::InvalidQuantity {
                    quantity: item.quantity,
                })?;
            if new_quantity > current_stock {
                return Err(CartError::StockExceeded {
                    product_id: item.product_id.to_string(),
                    requested: new_quantity,
                    available: current_stock,
                });
            }
            if existing.price.checked_multiply(new_quantity).is_none() {
                return Err(CartError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            existing.set_quantity(new_quantity, current_stock);
        } else {
            if item.quantity > current_stock {
                return Err(CartError::StockExceeded {
                    product_id: item.product_id.to_string(),
                    requested: item.quantity,
                    available: current_stock,
                });
            }
            if item.price.checked_multiply(item.quantity).is_none() {
                return Err(CartError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            self.items.push(CartItem::new(item, current_stock, now));
        }

        self.touch(now);
        Ok(())
    }

    /// Overwrites the quantity of an existing line.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        current_stock: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        self.ensure_active(now)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;

        if quantity <= 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        if quantity > current_stock {
            return Err(CartError::StockExceeded {
                product_id: product_id.to_string(),
                requested: quantity,
                available: current_stock,
            });
        }
        if item.price.checked_multiply(quantity).is_none() {
            return Err(CartError::InvalidQuantity { quantity });
        }

        item.set_quantity(quantity, current_stock);
        self.touch(now);
        Ok(())
    }

    /// Removes a line. Removing an absent product is a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId, now: DateTime<Utc>) -> Result<(), CartError> {
        self.ensure_active(now)?;
        self.items.retain(|i| &i.product_id != product_id);
        self.touch(now);
        Ok(())
    }

    /// Removes every line.
    pub fn clear(&mut self, now: DateTime<Utc>) -> Result<(), CartError> {
        self.ensure_active(now)?;
        self.items.clear();
        self.touch(now);
        Ok(())
    }

    /// Empties the cart and freezes it as checked out.
    pub fn mark_checked_out(&mut self, now: DateTime<Utc>) -> Result<(), CartError> {
        self.ensure_active(now)?;
        self.items.clear();
        self.total_amount = Money::zero();
        self.updated_at = now;
        self.status = CartStatus::CheckedOut;
        Ok(())
    }

    fn ensure_active(&mut self, now: DateTime<Utc>) -> Result<(), CartError> {
        self.check_expiration(now)?;
        if !self.status.can_mutate() {
            return Err(CartError::NotActive {
                status: self.status,
            });
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.total_amount = self.items.iter().map(|i| i.subtotal).sum();
        self.updated_at = now;
        self.expires_at = now + CART_TTL;
    }

    fn expired_error(&self) -> CartError {
        CartError::Expired {
            cart_id: self.id.to_string(),
            expired_at: self.expires_at,
        }
    }
}
