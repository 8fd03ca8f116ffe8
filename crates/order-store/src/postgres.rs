use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Money, Order, OrderItem, OrderNumber, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{OrderFilter, OrderStore, Result, StoreError};

const ORDER_COLUMNS: &str = "id, user_id, order_number, status, total_amount_minor, \
     payment_info, shipping_address, gateway_order_id, gateway_payment_id, \
     created_at, updated_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the orders schema if it does not exist.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(include_str!(
            "../../../migrations/001_create_orders_tables.sql"
        ))
        .execute(&self.pool)
        .await?;
        tracing::debug!("orders schema migrations applied");
        Ok(())
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str).map_err(|e| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(e.to_string())))
        })?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<i64, _>("user_id")?),
            order_number: OrderNumber::from_string(row.try_get::<String, _>("order_number")?),
            status,
            total_amount: Money::from_minor(row.try_get::<i64, _>("total_amount_minor")?),
            payment_info: row.try_get("payment_info")?,
            shipping_address: row.try_get("shipping_address")?,
            gateway_order_id: row.try_get("gateway_order_id")?,
            gateway_payment_id: row.try_get("gateway_payment_id")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            items,
        })
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, price_at_purchase_minor, product_name, image_url \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderItem {
                    product_id: row.try_get::<i64, _>("product_id")?.into(),
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    price_at_purchase: Money::from_minor(
                        row.try_get::<i64, _>("price_at_purchase_minor")?,
                    ),
                    product_name: row.try_get("product_name")?,
                    image_url: row.try_get("image_url")?,
                })
            })
            .collect()
    }

    async fn hydrate_orders(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = self.load_items(id).await?;
            orders.push(Self::row_to_order(row, items)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, order_number, status, total_amount_minor, \
             payment_info, shipping_address, gateway_order_id, gateway_payment_id, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_i64())
        .bind(order.order_number.as_str())
        .bind(order.status.as_str())
        .bind(order.total_amount.minor())
        .bind(&order.payment_info)
        .bind(&order.shipping_address)
        .bind(&order.gateway_order_id)
        .bind(&order.gateway_payment_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("orders_order_number_key") => {
                StoreError::DuplicateOrderNumber(order.order_number.as_str().to_string())
            }
            sqlx::Error::Database(db)
                if db.constraint() == Some("orders_gateway_order_id_key") =>
            {
                StoreError::DuplicateGatewayOrderId(
                    order.gateway_order_id.clone().unwrap_or_default(),
                )
            }
            _ => StoreError::Database(e),
        })?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, \
                 price_at_purchase_minor, product_name, image_url) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_i64())
            .bind(item.quantity as i32)
            .bind(item.price_at_purchase.minor())
            .bind(&item.product_name)
            .bind(&item.image_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = %order.id, items = order.items.len(), "order row inserted");
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.load_items(id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE gateway_order_id = $1"
        ))
        .bind(gateway_order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
                let items = self.load_items(id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_orders(rows).await
    }

    async fn search(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE"
        ));

        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(from) = filter.created_from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.created_to {
            builder.push(" AND created_at <= ").push_bind(to);
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        self.hydrate_orders(rows).await
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, gateway_order_id = $3, \
             gateway_payment_id = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.gateway_order_id)
        .bind(&order.gateway_payment_id)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if db.constraint() == Some("orders_gateway_order_id_key") =>
            {
                StoreError::DuplicateGatewayOrderId(
                    order.gateway_order_id.clone().unwrap_or_default(),
                )
            }
            _ => StoreError::Database(e),
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order.id));
        }
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        // order_items rows go with the order via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }
}
