//! Request types and validation for order placement.
//!
//! Validation happens in plain functions before the orchestrator is
//! invoked, so transport layers can reject malformed requests without
//! touching any collaborator.

use serde::{Deserialize, Serialize};

use super::{Money, OrderError, ProductId};

/// One requested order line, with the client-declared unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Declared unit price in minor units. Authoritative for the order
    /// even when it disagrees with the catalog (mismatch is logged).
    pub price_at_purchase: Money,
}

/// A direct order placement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: i64,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub payment_info: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

/// Validates a placement request.
///
/// Checks: positive user ID, non-empty item list, quantity at least 1 and
/// a positive declared price on every item.
pub fn validate_place_order(request: &PlaceOrderRequest) -> Result<(), OrderError> {
    if request.user_id <= 0 {
        return Err(OrderError::InvalidUserId {
            user_id: request.user_id,
        });
    }

    if request.items.is_empty() {
        return Err(OrderError::NoItems);
    }

    for item in &request.items {
        if item.quantity < 1 {
            return Err(OrderError::InvalidQuantity {
                quantity: item.quantity,
            });
        }
        if !item.price_at_purchase.is_positive() {
            return Err(OrderError::InvalidPrice {
                price: item.price_at_purchase.minor(),
            });
        }
    }

    Ok(())
}
