//! Search filter for orders.

use chrono::{DateTime, Utc};
use domain::{Order, OrderStatus};

/// Optional search predicates composed with logical AND.
///
/// An unspecified field is omitted from the predicate entirely, never
/// treated as "match nothing".
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    /// Creates an empty filter that matches every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to orders in the given status.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to orders created at or after the given instant.
    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    /// Restricts to orders created at or before the given instant.
    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Returns true when the order satisfies every specified predicate.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(from) = self.created_from
            && order.created_at < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && order.created_at > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::UserId;
    use domain::{Money, OrderItem};

    fn sample_order(status: OrderStatus) -> Order {
        let mut order = Order::place(
            UserId::new(1),
            vec![OrderItem::new(7, 1, Money::from_minor(100), "W", "u")],
            "card",
            "addr",
        );
        order.status = status;
        order
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = OrderFilter::new();
        assert!(filter.matches(&sample_order(OrderStatus::Pending)));
        assert!(filter.matches(&sample_order(OrderStatus::Delivered)));
    }

    #[test]
    fn test_status_filter() {
        let filter = OrderFilter::new().with_status(OrderStatus::Paid);
        assert!(filter.matches(&sample_order(OrderStatus::Paid)));
        assert!(!filter.matches(&sample_order(OrderStatus::Pending)));
    }

    #[test]
    fn test_date_range_filters_compose_with_and() {
        let order = sample_order(OrderStatus::Pending);
        let before = order.created_at - Duration::hours(1);
        let after = order.created_at + Duration::hours(1);

        let inside = OrderFilter::new().created_from(before).created_to(after);
        assert!(inside.matches(&order));

        let outside = OrderFilter::new().created_from(after);
        assert!(!outside.matches(&order));

        let mixed = OrderFilter::new()
            .with_status(OrderStatus::Paid)
            .created_from(before);
        assert!(!mixed.matches(&order));
    }
}
