//! Order orchestration: placement with stock reservation, cart checkout,
//! payment initiation, and gateway webhook handling.

pub mod error;
pub mod orchestrator;
pub mod services;
pub mod webhook;

pub use error::{OrchestrationError, Result};
pub use orchestrator::{
    OrchestratorConfig, OrderOrchestrator, PaymentInitiation, WebhookDisposition,
};
pub use services::{
    Cart, CartClient, CartItem, GatewayOrder, InMemoryCartClient, InMemoryInventoryClient,
    InMemoryPaymentGateway, InventoryClient, PaymentGateway, Product,
};
pub use webhook::{WebhookEvent, WebhookEventKind, parse_event, sign, verify_signature};
