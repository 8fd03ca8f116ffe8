//! Client traits for the external services the orchestrator depends on,
//! with in-memory implementations used by tests.

pub mod cart;
pub mod inventory;
pub mod payment;

pub use cart::{Cart, CartClient, CartItem, InMemoryCartClient};
pub use inventory::{InMemoryInventoryClient, InventoryClient, Product};
pub use payment::{GatewayOrder, InMemoryPaymentGateway, PaymentGateway};
