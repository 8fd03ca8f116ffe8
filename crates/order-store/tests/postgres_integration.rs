//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::UserId;
use domain::{Money, Order, OrderItem, OrderStatus};
use order_store::{OrderFilter, OrderStore, PostgresOrderStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresOrderStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    let store = PostgresOrderStore::new(pool);
    store.run_migrations().await.unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders")
        .execute(store.pool())
        .await
        .unwrap();

    store
}

fn sample_order(user: i64) -> Order {
    Order::place(
        UserId::new(user),
        vec![
            OrderItem::new(7, 2, Money::from_minor(1000), "Widget", "http://img/7.png"),
            OrderItem::new(8, 1, Money::from_minor(2500), "Gadget", "http://img/8.png"),
        ],
        "card",
        "1 Main St",
    )
}

#[tokio::test]
async fn test_insert_and_get_roundtrip() {
    let store = get_test_store().await;
    let order = sample_order(1);

    store.insert(&order).await.unwrap();

    let loaded = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, order.id);
    assert_eq!(loaded.order_number, order.order_number);
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert_eq!(loaded.total_amount.minor(), 4500);
    assert_eq!(loaded.items, order.items);
}

#[tokio::test]
async fn test_duplicate_order_number_rejected() {
    let store = get_test_store().await;
    let order = sample_order(1);
    store.insert(&order).await.unwrap();

    let mut dup = sample_order(2);
    dup.order_number = order.order_number.clone();
    let result = store.insert(&dup).await;
    assert!(matches!(result, Err(StoreError::DuplicateOrderNumber(_))));
}

#[tokio::test]
async fn test_duplicate_gateway_order_id_rejected() {
    let store = get_test_store().await;
    let mut order = sample_order(1);
    order.attach_gateway_order("gw_dup");
    store.insert(&order).await.unwrap();

    let mut inserted_dup = sample_order(2);
    inserted_dup.attach_gateway_order("gw_dup");
    let result = store.insert(&inserted_dup).await;
    assert!(matches!(
        result,
        Err(StoreError::DuplicateGatewayOrderId(id)) if id == "gw_dup"
    ));

    let mut updated_dup = sample_order(3);
    store.insert(&updated_dup).await.unwrap();
    updated_dup.attach_gateway_order("gw_dup");
    let result = store.update(&updated_dup).await;
    assert!(matches!(
        result,
        Err(StoreError::DuplicateGatewayOrderId(_))
    ));
}

#[tokio::test]
async fn test_lookup_by_gateway_order_id() {
    let store = get_test_store().await;
    let mut order = sample_order(1);
    order.attach_gateway_order("gw_abc");
    store.insert(&order).await.unwrap();

    let found = store.get_by_gateway_order_id("gw_abc").await.unwrap();
    assert_eq!(found.unwrap().id, order.id);

    assert!(
        store
            .get_by_gateway_order_id("gw_missing")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_list_for_user() {
    let store = get_test_store().await;
    store.insert(&sample_order(10)).await.unwrap();
    store.insert(&sample_order(10)).await.unwrap();
    store.insert(&sample_order(11)).await.unwrap();

    let orders = store.list_for_user(UserId::new(10)).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.user_id == UserId::new(10)));
}

#[tokio::test]
async fn test_search_composes_filters_with_and() {
    let store = get_test_store().await;
    let mut paid = sample_order(1);
    paid.set_status(OrderStatus::Paid);
    store.insert(&paid).await.unwrap();
    store.insert(&sample_order(1)).await.unwrap();

    let by_status = OrderFilter::new().with_status(OrderStatus::Paid);
    let found = store.search(&by_status).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, paid.id);

    // Empty filter matches everything
    let all = store.search(&OrderFilter::new()).await.unwrap();
    assert_eq!(all.len(), 2);

    // Date window in the future matches nothing
    let future = OrderFilter::new().created_from(chrono::Utc::now() + chrono::Duration::hours(1));
    assert!(store.search(&future).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_persists_status_and_payment_fields() {
    let store = get_test_store().await;
    let order = sample_order(1);
    store.insert(&order).await.unwrap();

    let mut mutated = order.clone();
    mutated.attach_gateway_order("gw_upd");
    store.update(&mutated).await.unwrap();
    mutated.record_payment_outcome(OrderStatus::Paid, Some("pay_9".to_string()));
    store.update(&mutated).await.unwrap();

    let loaded = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Paid);
    assert_eq!(loaded.gateway_order_id.as_deref(), Some("gw_upd"));
    assert_eq!(loaded.gateway_payment_id.as_deref(), Some("pay_9"));
    // total and items untouched
    assert_eq!(loaded.total_amount, order.total_amount);
    assert_eq!(loaded.items, order.items);
}

#[tokio::test]
async fn test_update_missing_order_fails() {
    let store = get_test_store().await;
    let result = store.update(&sample_order(1)).await;
    assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
async fn test_delete_cascades_items() {
    let store = get_test_store().await;
    let order = sample_order(1);
    store.insert(&order).await.unwrap();

    store.delete(order.id).await.unwrap();
    assert!(store.get(order.id).await.unwrap().is_none());

    let item_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(item_count, 0);

    let again = store.delete(order.id).await;
    assert!(matches!(again, Err(StoreError::OrderNotFound(_))));
}
