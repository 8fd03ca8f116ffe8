//! Order status lifecycle.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order.
///
/// A single flat enum covering two sub-flows, matching the upstream data
/// model:
///
/// ```text
/// payment:      Pending ──► PendingPayment ──► {Authorized, Paid, Failed} ──► Refunded
/// fulfillment:  Confirmed ──► Shipped ──► Delivered
/// ```
///
/// `Cancelled` is reachable from early states. No transition-adjacency
/// validation is enforced: any status may be set from any other through
/// the status-update operation. A cleaner model would split payment and
/// fulfillment into two fields; kept flat here deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order recorded, payment not yet initiated.
    #[default]
    Pending,

    /// A gateway payment order exists, awaiting the webhook outcome.
    PendingPayment,

    /// Payment authorized but not yet captured.
    Authorized,

    /// Payment captured.
    Paid,

    /// Payment failed.
    Failed,

    /// Payment refunded.
    Refunded,

    /// Order confirmed and ready for fulfillment.
    Confirmed,

    /// Order shipped.
    Shipped,

    /// Order delivered.
    Delivered,

    /// Order cancelled.
    Cancelled,
}

impl OrderStatus {
    /// All known statuses, in declaration order.
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Pending,
        OrderStatus::PendingPayment,
        OrderStatus::Authorized,
        OrderStatus::Paid,
        OrderStatus::Failed,
        OrderStatus::Refunded,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if payment initiation is legal in this status.
    pub fn can_initiate_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PendingPayment)
    }

    /// Returns the status name as stored and exposed on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Authorized => "AUTHORIZED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Refunded => "REFUNDED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status name, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, OrderError> {
        let upper = value.trim().to_uppercase();
        Self::ALL
            .iter()
            .find(|s| s.as_str() == upper)
            .copied()
            .ok_or_else(|| OrderError::InvalidStatus {
                value: value.to_string(),
                valid: Self::ALL
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
