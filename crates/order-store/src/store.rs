//! The order store trait.

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::Order;

use crate::{OrderFilter, Result};

/// Persistent storage for orders and their line items.
///
/// Implementations must write an order and its items atomically in
/// `insert`, and must enforce uniqueness of `order_number` and
/// `gateway_order_id`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with its items in one transaction.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Looks up an order by internal ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Looks up an order by the gateway-side order ID set during payment
    /// initiation.
    async fn get_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>>;

    /// Lists all orders owned by a user, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Lists orders matching the filter, newest first.
    async fn search(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Persists mutated status/payment fields of an existing order.
    ///
    /// Items and total amount are immutable after creation and are never
    /// rewritten here. Fails with `OrderNotFound` if the order is absent.
    async fn update(&self, order: &Order) -> Result<()>;

    /// Hard-deletes an order and its items (administrative operation).
    ///
    /// Fails with `OrderNotFound` if the order is absent.
    async fn delete(&self, id: OrderId) -> Result<()>;
}
