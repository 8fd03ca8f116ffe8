//! Inventory service client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Money, ProductId};

use crate::error::OrchestrationError;

/// A product as reported by the inventory service.
#[derive(Debug, Clone)]
pub struct Product {
    /// The product's identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current catalog price.
    pub price: Money,
    /// Units currently in stock.
    pub stock: u32,
    /// Optional product image URL.
    pub image_url: Option<String>,
}

/// Trait for the inventory service the orchestrator reserves stock against.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetches a product by ID.
    async fn get_product(&self, product_id: ProductId) -> Result<Product, OrchestrationError>;

    /// Reserves `quantity` units of a product, decrementing available stock.
    async fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), OrchestrationError>;

    /// Releases a previously reserved quantity back into stock.
    async fn release_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), OrchestrationError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, Product>,
    fail_on_reserve: bool,
    fail_on_release: bool,
    response_delay: Option<Duration>,
}

/// In-memory inventory client for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates a new in-memory inventory client with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product in the catalog.
    pub fn seed_product(&self, product: Product) {
        let mut state = self.state.write().unwrap();
        state.products.insert(product.id, product);
    }

    /// Configures the client to fail reserve calls.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Configures the client to fail release calls.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.state.write().unwrap().fail_on_release = fail;
    }

    /// Delays every call by `delay`, simulating a slow inventory service.
    pub fn set_response_delay(&self, delay: Duration) {
        self.state.write().unwrap().response_delay = Some(delay);
    }

    // The delay is read before sleeping so the lock is not held across
    // an await point.
    async fn simulate_latency(&self) {
        let delay = self.state.read().unwrap().response_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Returns the current stock level for a product, if it exists.
    pub fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn get_product(&self, product_id: ProductId) -> Result<Product, OrchestrationError> {
        self.simulate_latency().await;
        let state = self.state.read().unwrap();
        state.products.get(&product_id).cloned().ok_or_else(|| {
            OrchestrationError::NotFound(format!("Product not found with id: {product_id}"))
        })
    }

    async fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), OrchestrationError> {
        self.simulate_latency().await;
        let mut state = self.state.write().unwrap();

        if state.fail_on_reserve {
            return Err(OrchestrationError::DependencyFailure(
                "Inventory service unavailable".to_string(),
            ));
        }

        let product = state.products.get_mut(&product_id).ok_or_else(|| {
            OrchestrationError::NotFound(format!("Product not found with id: {product_id}"))
        })?;

        if product.stock < quantity {
            return Err(OrchestrationError::InsufficientStock(format!(
                "Product {product_id}: requested {quantity}, available {}",
                product.stock
            )));
        }

        product.stock -= quantity;
        Ok(())
    }

    async fn release_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), OrchestrationError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_release {
            return Err(OrchestrationError::DependencyFailure(
                "Inventory service unavailable".to_string(),
            ));
        }

        if let Some(product) = state.products.get_mut(&product_id) {
            product.stock += quantity;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        Product {
            id: ProductId::new(7),
            name: "Widget".to_string(),
            price: Money::from_minor(1000),
            stock,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let client = InMemoryInventoryClient::new();
        client.seed_product(widget(5));

        client.reserve_stock(ProductId::new(7), 2).await.unwrap();
        assert_eq!(client.stock_of(ProductId::new(7)), Some(3));
    }

    #[tokio::test]
    async fn test_reserve_more_than_available() {
        let client = InMemoryInventoryClient::new();
        client.seed_product(widget(1));

        let result = client.reserve_stock(ProductId::new(7), 2).await;
        assert!(matches!(
            result,
            Err(OrchestrationError::InsufficientStock(_))
        ));
        assert_eq!(client.stock_of(ProductId::new(7)), Some(1));
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let client = InMemoryInventoryClient::new();
        client.seed_product(widget(5));

        client.reserve_stock(ProductId::new(7), 3).await.unwrap();
        client.release_stock(ProductId::new(7), 3).await.unwrap();
        assert_eq!(client.stock_of(ProductId::new(7)), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let client = InMemoryInventoryClient::new();
        let result = client.get_product(ProductId::new(42)).await;
        assert!(matches!(result, Err(OrchestrationError::NotFound(_))));
    }
}
