//! Cart commands.

use common::UserId;

use crate::value_objects::ProductId;

/// Command to add a product to a user's cart.
#[derive(Debug, Clone)]
pub struct AddCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
}

impl AddCartItem {
    pub fn new(user_id: UserId, product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            user_id,
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to overwrite the quantity of a cart line.
#[derive(Debug, Clone)]
pub struct UpdateCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
}

impl UpdateCartItem {
    pub fn new(user_id: UserId, product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            user_id,
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to drop a cart line.
#[derive(Debug, Clone)]
pub struct RemoveCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
}

impl RemoveCartItem {
    pub fn new(user_id: UserId, product_id: impl Into<ProductId>) -> Self {
        Self {
            user_id,
            product_id: product_id.into(),
        }
    }
}
