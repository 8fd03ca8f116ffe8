//! Wire payloads published to downstream consumers.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{Money, Order, OrderStatus, ProductId};

/// Snapshot of one order line as carried in the event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price_at_purchase: Money,
    pub image_url: String,
}

/// Event announcing that an order exists (or, on the payment path, that it
/// was paid).
///
/// This is the only representation downstream consumers ever see, so it is
/// self-contained: no further lookups are required to act on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_info: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemSnapshot>,
}

impl OrderPlacedEvent {
    /// Builds the event payload from the current order state.
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            order_number: order.order_number.as_str().to_string(),
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address.clone(),
            payment_info: order.payment_info.clone(),
            gateway_order_id: order.gateway_order_id.clone(),
            gateway_payment_id: order.gateway_payment_id.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order
                .items
                .iter()
                .map(|item| OrderItemSnapshot {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price_at_purchase: item.price_at_purchase,
                    image_url: item.image_url.clone(),
                })
                .collect(),
        }
    }
}
