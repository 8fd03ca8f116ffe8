//! Order storage layer.
//!
//! Provides the [`OrderStore`] trait with an in-memory implementation for
//! tests and a PostgreSQL implementation for production. A single
//! order-plus-items write is one atomic local transaction; `order_number`
//! and `gateway_order_id` are uniquely indexed.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use query::OrderFilter;
pub use store::OrderStore;
