use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderFilter, OrderStore, Result, StoreError};

/// In-memory order store implementation for testing.
///
/// Stores all orders in memory and provides the same interface and
/// uniqueness guarantees as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;

        if orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(
                order.order_number.as_str().to_string(),
            ));
        }
        if let Some(gateway_order_id) = &order.gateway_order_id
            && orders
                .values()
                .any(|o| o.gateway_order_id.as_ref() == Some(gateway_order_id))
        {
            return Err(StoreError::DuplicateGatewayOrderId(gateway_order_id.clone()));
        }

        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn get_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.gateway_order_id.as_deref() == Some(gateway_order_id))
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn search(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;

        if let Some(gateway_order_id) = &order.gateway_order_id
            && orders
                .values()
                .any(|o| o.id != order.id && o.gateway_order_id.as_ref() == Some(gateway_order_id))
        {
            return Err(StoreError::DuplicateGatewayOrderId(gateway_order_id.clone()));
        }

        match orders.get_mut(&order.id) {
            Some(stored) => {
                // Items and total are immutable after creation.
                stored.status = order.status;
                stored.gateway_order_id = order.gateway_order_id.clone();
                stored.gateway_payment_id = order.gateway_payment_id.clone();
                stored.updated_at = order.updated_at;
                Ok(())
            }
            None => Err(StoreError::OrderNotFound(order.id)),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        match self.orders.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderItem, OrderStatus};

    fn sample_order(user: i64) -> Order {
        Order::place(
            UserId::new(user),
            vec![OrderItem::new(7, 2, Money::from_minor(1000), "Widget", "u")],
            "card",
            "addr",
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryOrderStore::new();
        let order = sample_order(1);

        store.insert(&order).await.unwrap();

        let loaded = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rejected() {
        let store = InMemoryOrderStore::new();
        let order = sample_order(1);
        store.insert(&order).await.unwrap();

        let mut dup = sample_order(2);
        dup.order_number = order.order_number.clone();
        let result = store.insert(&dup).await;
        assert!(matches!(result, Err(StoreError::DuplicateOrderNumber(_))));
    }

    #[tokio::test]
    async fn test_duplicate_gateway_order_id_rejected_on_insert() {
        let store = InMemoryOrderStore::new();
        let mut order = sample_order(1);
        order.attach_gateway_order("gw_dup");
        store.insert(&order).await.unwrap();

        let mut dup = sample_order(2);
        dup.attach_gateway_order("gw_dup");
        let result = store.insert(&dup).await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicateGatewayOrderId(id)) if id == "gw_dup"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_gateway_order_id_rejected_on_update() {
        let store = InMemoryOrderStore::new();
        let mut first = sample_order(1);
        first.attach_gateway_order("gw_dup");
        store.insert(&first).await.unwrap();

        let mut second = sample_order(2);
        store.insert(&second).await.unwrap();
        second.attach_gateway_order("gw_dup");
        let result = store.update(&second).await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicateGatewayOrderId(_))
        ));

        // re-updating an order with its own gateway id stays fine
        first.set_status(OrderStatus::Paid);
        store.update(&first).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_by_gateway_order_id() {
        let store = InMemoryOrderStore::new();
        let mut order = sample_order(1);
        order.attach_gateway_order("gw_123");
        store.insert(&order).await.unwrap();

        let found = store.get_by_gateway_order_id("gw_123").await.unwrap();
        assert_eq!(found.unwrap().id, order.id);

        let missing = store.get_by_gateway_order_id("gw_999").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_filters_by_owner() {
        let store = InMemoryOrderStore::new();
        store.insert(&sample_order(1)).await.unwrap();
        store.insert(&sample_order(1)).await.unwrap();
        store.insert(&sample_order(2)).await.unwrap();

        let for_user_1 = store.list_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(for_user_1.len(), 2);

        let for_user_3 = store.list_for_user(UserId::new(3)).await.unwrap();
        assert!(for_user_3.is_empty());
    }

    #[tokio::test]
    async fn test_search_with_status_filter() {
        let store = InMemoryOrderStore::new();
        let mut paid = sample_order(1);
        paid.set_status(OrderStatus::Paid);
        store.insert(&paid).await.unwrap();
        store.insert(&sample_order(1)).await.unwrap();

        let filter = OrderFilter::new().with_status(OrderStatus::Paid);
        let found = store.search(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, paid.id);
    }

    #[tokio::test]
    async fn test_update_only_touches_status_and_payment_fields() {
        let store = InMemoryOrderStore::new();
        let order = sample_order(1);
        store.insert(&order).await.unwrap();

        let mut mutated = order.clone();
        mutated.record_payment_outcome(OrderStatus::Paid, Some("pay_1".to_string()));
        store.update(&mutated).await.unwrap();

        let loaded = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Paid);
        assert_eq!(loaded.gateway_payment_id.as_deref(), Some("pay_1"));
        assert_eq!(loaded.total_amount, order.total_amount);
        assert_eq!(loaded.items, order.items);
    }

    #[tokio::test]
    async fn test_update_missing_order_fails() {
        let store = InMemoryOrderStore::new();
        let order = sample_order(1);
        let result = store.update(&order).await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryOrderStore::new();
        let order = sample_order(1);
        store.insert(&order).await.unwrap();

        store.delete(order.id).await.unwrap();
        assert!(store.get(order.id).await.unwrap().is_none());

        let again = store.delete(order.id).await;
        assert!(matches!(again, Err(StoreError::OrderNotFound(_))));
    }
}
