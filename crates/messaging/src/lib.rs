//! Event publication and consumption for the order engine.
//!
//! Publishes `OrderPlacedEvent` payloads under a fixed routing key on a
//! topic-like exchange, tracking broker confirms and unroutable returns
//! per correlation id. The consumer side deduplicates by order id through
//! a pluggable [`DedupStore`] and distinguishes transient failures
//! (redelivery) from permanent ones (dead-letter).

pub mod consumer;
pub mod dedup;
pub mod error;
pub mod publisher;

pub use consumer::{ConsumeOutcome, EventListener, OrderEventListener, drain_queue};
pub use dedup::{DedupStore, InMemoryDedupStore};
pub use error::{PublishError, Result};
pub use publisher::{
    Delivery, EventPublisher, InMemoryBroker, ORDER_EXCHANGE_NAME, ORDER_PLACED_QUEUE_NAME,
    ORDER_PLACED_ROUTING_KEY,
};
