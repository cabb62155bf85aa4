//! Checkout input validation.
//!
//! Validation is fail-fast; the first violated rule wins, in this order:
//! user, products, shipping address, payment method, then per line product
//! existence, quantity and price, stock.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::value_objects::ProductId;

use super::{OrderDetails, OrderError, OrderLine};

/// A requested product and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    pub quantity: i64,
}

impl DraftLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Unvalidated checkout input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub user_id: Option<UserId>,
    pub lines: Vec<DraftLine>,
    pub details: OrderDetails,
}

impl OrderDraft {
    /// Runs the rules that need no catalog lookup.
    pub fn validate_header(&self) -> Result<UserId, OrderError> {
        let user_id = self.user_id.ok_or(OrderError::UserRequired)?;
        if self.lines.is_empty() {
            return Err(OrderError::NoProducts);
        }
        self.details.validate()?;
        Ok(user_id)
    }

    /// Returns the lines with repeated products folded into one line each,
    /// in first-seen order, so stock is checked against the combined
    /// quantity. Non-positive quantities are left as separate lines.
    pub fn merged_lines(&self) -> Vec<DraftLine> {
        let mut merged: Vec<DraftLine> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let existing = merged.iter().position(|m| {
                line.quantity > 0 && m.quantity > 0 && m.product_id == line.product_id
            });
            match existing {
                Some(index) => {
                    merged[index].quantity = merged[index].quantity.saturating_add(line.quantity)
                }
                None => merged.push(line.clone()),
            }
        }
        merged
    }
}

/// Prices one requested line against the live catalog record.
pub fn price_line(line: &DraftLine, product: Option<&Product>) -> Result<OrderLine, OrderError> {
    let product = product.ok_or_else(|| OrderError::ProductNotFound {
        product_id: line.product_id.to_string(),
    })?;

    if line.quantity <= 0 {
        return Err(OrderError::InvalidQuantity {
            product_id: line.product_id.to_string(),
            quantity: line.quantity,
        });
    }
    if product.price.is_negative() {
        return Err(OrderError::InvalidPrice {
            product_id: line.product_id.to_string(),
            cents: product.price.cents(),
        });
    }
    if !product.has_stock_for(line.quantity) {
        return Err(OrderError::InsufficientStock {
            product_id: line.product_id.to_string(),
            requested: line.quantity,
            available: product.stock,
        });
    }
    if product.price.checked_multiply(line.quantity).is_none() {
        return Err(OrderError::InvalidQuantity {
            product_id: line.product_id.to_string(),
            quantity: line.quantity,
        });
    }

    Ok(OrderLine::new(
        product.id.clone(),
        product.name.clone(),
        product.price,
        line.quantity,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;

    fn draft() -> OrderDraft {
        OrderDraft {
            user_id: Some(UserId::new()),
            lines: vec![DraftLine::new("SKU-001", 2)],
            details: OrderDetails::new("Main St 1", "card"),
        }
    }

    #[test]
    fn test_valid_header() {
        let d = draft();
        assert_eq!(d.validate_header().unwrap(), d.user_id.unwrap());
    }

    #[test]
    fn test_user_is_checked_first() {
        let d = OrderDraft {
            user_id: None,
            lines: vec![],
            details: OrderDetails::default(),
        };
        assert!(matches!(d.validate_header(), Err(OrderError::UserRequired)));
    }

    #[test]
    fn test_products_checked_before_address() {
        let d = OrderDraft {
            lines: vec![],
            details: OrderDetails::default(),
            ..draft()
        };
        assert!(matches!(d.validate_header(), Err(OrderError::NoProducts)));
    }

    #[test]
    fn test_address_checked_before_payment() {
        let d = OrderDraft {
            details: OrderDetails::new("", ""),
            ..draft()
        };
        assert!(matches!(
            d.validate_header(),
            Err(OrderError::ShippingAddressRequired)
        ));
    }

    #[test]
    fn test_price_line_rules_in_order() {
        let product = Product::new("SKU-001", "Widget", Money::from_units(100), 3);

        assert!(matches!(
            price_line(&DraftLine::new("SKU-001", 0), None),
            Err(OrderError::ProductNotFound { .. })
        ));
        assert!(matches!(
            price_line(&DraftLine::new("SKU-001", 0), Some(&product)),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            price_line(&DraftLine::new("SKU-001", 4), Some(&product)),
            Err(OrderError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));

        let line = price_line(&DraftLine::new("SKU-001", 3), Some(&product)).unwrap();
        assert_eq!(line.subtotal, Money::from_units(300));
        assert_eq!(line.name, "Widget");
    }

    #[test]
    fn test_repeated_products_are_merged() {
        let d = OrderDraft {
            lines: vec![
                DraftLine::new("SKU-001", 3),
                DraftLine::new("SKU-002", 1),
                DraftLine::new("SKU-001", 3),
                DraftLine::new("SKU-002", 0),
            ],
            ..draft()
        };

        assert_eq!(
            d.merged_lines(),
            vec![
                DraftLine::new("SKU-001", 6),
                DraftLine::new("SKU-002", 1),
                DraftLine::new("SKU-002", 0),
            ]
        );
    }

    #[test]
    fn test_line_accepts_id_alias() {
        let line: DraftLine = serde_json::from_str(r#"{"id": "SKU-001", "quantity": 2}"#).unwrap();
        assert_eq!(line, DraftLine::new("SKU-001", 2));

        let line: DraftLine =
            serde_json::from_str(r#"{"product_id": "SKU-002", "quantity": 1}"#).unwrap();
        assert_eq!(line, DraftLine::new("SKU-002", 1));
    }

    #[test]
    fn test_line_total_overflow_is_invalid() {
        let product = Product::new("SKU-009", "Vault", Money::from_cents(i64::MAX / 2), i64::MAX);
        assert!(matches!(
            price_line(&DraftLine::new("SKU-009", 3), Some(&product)),
            Err(OrderError::InvalidQuantity { quantity: 3, .. })
        ));
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let product = Product::new("SKU-001", "Broken", Money::from_cents(-1), 3);
        assert!(matches!(
            price_line(&DraftLine::new("SKU-001", 1), Some(&product)),
            Err(OrderError::InvalidPrice { cents: -1, .. })
        ));
    }
}
