//! Order model and related types.

mod events;
mod model;
mod status;
mod validation;
mod value_objects;

pub use events::{OrderItemSnapshot, OrderPlacedEvent};
pub use model::Order;
pub use status::OrderStatus;
pub use validation::{OrderItemRequest, PlaceOrderRequest, validate_place_order};
pub use value_objects::{Money, OrderItem, OrderNumber, ProductId};

use thiserror::Error;

/// Errors that can occur during order domain operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Placement request contained no items.
    #[error("Order must contain at least one item")]
    NoItems,

    /// Item quantity below the minimum of one.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Item price is zero or negative.
    #[error("Invalid price: {price} minor units (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// User ID is missing or not positive.
    #[error("Invalid user ID: {user_id}")]
    InvalidUserId { user_id: i64 },

    /// Status string does not name a known status.
    #[error("Invalid order status: {value} (valid statuses are: {valid})")]
    InvalidStatus { value: String, valid: String },
}
