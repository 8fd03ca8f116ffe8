//! Cart service client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use domain::{Money, ProductId};

use crate::error::OrchestrationError;

/// One line of a shopping cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    /// The product in the cart.
    pub product_id: ProductId,
    /// Quantity added to the cart.
    pub quantity: u32,
    /// Unit price as captured when the item was added.
    pub price: Money,
}

/// A user's shopping cart as reported by the cart service.
#[derive(Debug, Clone)]
pub struct Cart {
    /// The cart owner.
    pub user_id: UserId,
    /// Lines currently in the cart.
    pub items: Vec<CartItem>,
}

/// Trait for the cart service checkout pulls from.
#[async_trait]
pub trait CartClient: Send + Sync {
    /// Fetches the current cart for a user.
    async fn get_cart(&self, user_id: UserId) -> Result<Cart, OrchestrationError>;

    /// Empties the user's cart after a successful checkout.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), OrchestrationError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<i64, Vec<CartItem>>,
    fail_on_clear: bool,
}

/// In-memory cart client for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartClient {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartClient {
    /// Creates a new in-memory cart client with no carts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cart contents for a user.
    pub fn set_cart(&self, user_id: UserId, items: Vec<CartItem>) {
        let mut state = self.state.write().unwrap();
        state.carts.insert(user_id.as_i64(), items);
    }

    /// Configures the client to fail clear calls.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().unwrap().fail_on_clear = fail;
    }

    /// Returns the number of lines currently in the user's cart.
    pub fn cart_len(&self, user_id: UserId) -> usize {
        self.state
            .read()
            .unwrap()
            .carts
            .get(&user_id.as_i64())
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl CartClient for InMemoryCartClient {
    async fn get_cart(&self, user_id: UserId) -> Result<Cart, OrchestrationError> {
        let state = self.state.read().unwrap();
        let items = state
            .carts
            .get(&user_id.as_i64())
            .cloned()
            .unwrap_or_default();
        Ok(Cart { user_id, items })
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), OrchestrationError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_clear {
            return Err(OrchestrationError::DependencyFailure(
                "Cart service unavailable".to_string(),
            ));
        }

        state.carts.remove(&user_id.as_i64());
        Ok(())
    }
}
