//! Domain layer for the order engine.
//!
//! This crate provides the core order model:
//! - `Order` and `OrderItem` with their creation invariants
//! - `OrderStatus` lifecycle enum
//! - `OrderPlacedEvent` wire payload for downstream consumers
//! - Request types and validation functions for order placement

pub mod order;

pub use order::{
    Money, Order, OrderError, OrderItem, OrderItemRequest, OrderItemSnapshot, OrderNumber,
    OrderPlacedEvent, OrderStatus, PlaceOrderRequest, ProductId, validate_place_order,
};
