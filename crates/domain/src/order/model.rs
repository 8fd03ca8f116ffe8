//! The order record and its creation invariants.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{Money, OrderItem, OrderNumber, OrderStatus};

/// One purchase transaction and its line items.
///
/// Items are owned by the order (composition): they are created with the
/// order and have no independent lifecycle. `total_amount` equals the sum
/// of line totals at creation time; gateway-driven updates only ever touch
/// the status and payment fields, never the amount or items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Internal identifier.
    pub id: OrderId,

    /// Owner of the order.
    pub user_id: UserId,

    /// Externally unique reference, assigned exactly once at creation.
    pub order_number: OrderNumber,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// Sum of `quantity * price_at_purchase` over all items at creation.
    pub total_amount: Money,

    /// Free-text payment description.
    pub payment_info: String,

    /// Free-text shipping address.
    pub shipping_address: String,

    /// Gateway-side order ID, set when payment is initiated.
    pub gateway_order_id: Option<String>,

    /// Gateway-side payment ID, set when a payment is observed.
    pub gateway_payment_id: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Bumped on every mutation.
    pub updated_at: DateTime<Utc>,

    /// Purchased line items.
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates a new order in `Pending` status.
    ///
    /// The total amount is computed from the items; the order number is
    /// generated here and never changes afterwards.
    pub fn place(
        user_id: UserId,
        items: Vec<OrderItem>,
        payment_info: impl Into<String>,
        shipping_address: impl Into<String>,
    ) -> Self {
        let total_amount = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total());
        let now = Utc::now();

        Self {
            id: OrderId::new(),
            user_id,
            order_number: OrderNumber::generate(),
            status: OrderStatus::Pending,
            total_amount,
            payment_info: payment_info.into(),
            shipping_address: shipping_address.into(),
            gateway_order_id: None,
            gateway_payment_id: None,
            created_at: now,
            updated_at: now,
            items,
        }
    }

    /// Sets a new status and bumps `updated_at`.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Records the gateway order ID created during payment initiation and
    /// moves the order to `PendingPayment`.
    pub fn attach_gateway_order(&mut self, gateway_order_id: impl Into<String>) {
        self.gateway_order_id = Some(gateway_order_id.into());
        self.status = OrderStatus::PendingPayment;
        self.updated_at = Utc::now();
    }

    /// Applies a payment outcome reported by the gateway webhook.
    pub fn record_payment_outcome(&mut self, status: OrderStatus, payment_id: Option<String>) {
        if let Some(id) = payment_id {
            self.gateway_payment_id = Some(id);
        }
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Recomputes the sum of line totals, for invariant checks.
    pub fn items_total(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total())
    }
}
