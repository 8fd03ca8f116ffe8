//! Event publisher with confirm/return tracking.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use domain::OrderPlacedEvent;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{PublishError, Result};

/// Name of the topic exchange orders are published to.
pub const ORDER_EXCHANGE_NAME: &str = "order.exchange";

/// Durable queue bound to the exchange for the notification consumer.
pub const ORDER_PLACED_QUEUE_NAME: &str = "order.placed.queue";

/// Routing key for order-placed events.
pub const ORDER_PLACED_ROUTING_KEY: &str = "order.placed";

/// One message as delivered to a consumer queue.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Unique id assigned at publish time, used for confirm/return tracking.
    pub correlation_id: String,
    /// Routing key the message was published under.
    pub routing_key: String,
    /// JSON event payload.
    pub payload: serde_json::Value,
    /// Number of times this message has been delivered before.
    pub redelivery_count: u32,
}

/// Publishes domain events to the order exchange.
///
/// `publish` returns the correlation id of the sent message. Errors cover
/// immediate send-time failures only; callers treat publication as a
/// best-effort side channel and must not fail user-facing operations on it.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an order-placed event under the fixed routing key.
    async fn publish(&self, event: &OrderPlacedEvent) -> Result<String>;
}

/// Broker-level acknowledgment that a published message was accepted.
#[derive(Debug, Clone)]
pub struct ConfirmRecord {
    pub correlation_id: String,
    pub ack: bool,
}

/// Notification that a published message could not be routed to any queue.
#[derive(Debug, Clone)]
pub struct ReturnRecord {
    pub correlation_id: String,
    pub routing_key: String,
}

#[derive(Default)]
struct BrokerState {
    /// routing key -> bound queue names
    bindings: HashMap<String, Vec<String>>,
    queues: HashMap<String, VecDeque<Delivery>>,
    confirms: Vec<ConfirmRecord>,
    returns: Vec<ReturnRecord>,
    dead_letters: Vec<Delivery>,
    fail_on_publish: bool,
}

/// In-memory broker standing in for a topic exchange with publisher
/// confirms and mandatory returns.
///
/// A published message is confirmed once the broker accepts it; if no
/// queue is bound to its routing key it is additionally recorded as
/// returned (a configuration error, not a transient fault). Both records
/// are independent of the publish call's result, matching the contract of
/// a real broker where they arrive asynchronously.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<RwLock<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates a broker with no queues or bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broker with the order topology declared: the order-placed
    /// queue bound to the exchange under the fixed routing key.
    pub async fn with_order_topology() -> Self {
        let broker = Self::new();
        broker
            .bind_queue(ORDER_PLACED_QUEUE_NAME, ORDER_PLACED_ROUTING_KEY)
            .await;
        broker
    }

    /// Declares a queue and binds it to a routing key.
    pub async fn bind_queue(&self, queue: &str, routing_key: &str) {
        let mut state = self.state.write().await;
        state
            .bindings
            .entry(routing_key.to_string())
            .or_default()
            .push(queue.to_string());
        state.queues.entry(queue.to_string()).or_default();
    }

    /// Simulates a broker connection failure on subsequent publishes.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Pops the next delivery from a queue, if any.
    pub async fn pop_delivery(&self, queue: &str) -> Option<Delivery> {
        self.state
            .write()
            .await
            .queues
            .get_mut(queue)
            .and_then(VecDeque::pop_front)
    }

    /// Requeues a delivery for another attempt, bumping its redelivery count.
    pub async fn requeue(&self, queue: &str, mut delivery: Delivery) {
        delivery.redelivery_count += 1;
        if let Some(q) = self.state.write().await.queues.get_mut(queue) {
            q.push_back(delivery);
        }
    }

    /// Routes a delivery to the dead-letter store instead of requeuing it.
    pub async fn dead_letter(&self, delivery: Delivery) {
        metrics::counter!("broker_dead_letters_total").increment(1);
        self.state.write().await.dead_letters.push(delivery);
    }

    /// Number of messages waiting in a queue.
    pub async fn queue_len(&self, queue: &str) -> usize {
        self.state
            .read()
            .await
            .queues
            .get(queue)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Broker confirms recorded so far.
    pub async fn confirms(&self) -> Vec<ConfirmRecord> {
        self.state.read().await.confirms.clone()
    }

    /// Unroutable returns recorded so far.
    pub async fn returns(&self) -> Vec<ReturnRecord> {
        self.state.read().await.returns.clone()
    }

    /// Dead-lettered deliveries recorded so far.
    pub async fn dead_letters(&self) -> Vec<Delivery> {
        self.state.read().await.dead_letters.clone()
    }

    /// True if the given correlation id was confirmed by the broker.
    pub async fn is_confirmed(&self, correlation_id: &str) -> bool {
        self.state
            .read()
            .await
            .confirms
            .iter()
            .any(|c| c.correlation_id == correlation_id && c.ack)
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    async fn publish(&self, event: &OrderPlacedEvent) -> Result<String> {
        let correlation_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_value(event)?;

        let mut state = self.state.write().await;

        if state.fail_on_publish {
            return Err(PublishError::Disconnected(
                "broker connection refused".to_string(),
            ));
        }

        tracing::info!(
            order_id = %event.order_id,
            %correlation_id,
            routing_key = ORDER_PLACED_ROUTING_KEY,
            "publishing order placed event"
        );

        let bound: Vec<String> = state
            .bindings
            .get(ORDER_PLACED_ROUTING_KEY)
            .cloned()
            .unwrap_or_default();

        if bound.is_empty() {
            // Unroutable: confirmed by the broker but returned to the
            // publisher. Indicates a topology misconfiguration.
            metrics::counter!("publisher_returns_total").increment(1);
            tracing::warn!(
                %correlation_id,
                routing_key = ORDER_PLACED_ROUTING_KEY,
                "message returned: no queue bound to routing key"
            );
            state.returns.push(ReturnRecord {
                correlation_id: correlation_id.clone(),
                routing_key: ORDER_PLACED_ROUTING_KEY.to_string(),
            });
        } else {
            for queue in &bound {
                let delivery = Delivery {
                    correlation_id: correlation_id.clone(),
                    routing_key: ORDER_PLACED_ROUTING_KEY.to_string(),
                    payload: payload.clone(),
                    redelivery_count: 0,
                };
                if let Some(q) = state.queues.get_mut(queue) {
                    q.push_back(delivery);
                }
            }
        }

        metrics::counter!("publisher_confirms_total").increment(1);
        state.confirms.push(ConfirmRecord {
            correlation_id: correlation_id.clone(),
            ack: true,
        });

        Ok(correlation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;
    use domain::{Money, Order, OrderItem};

    fn sample_event() -> OrderPlacedEvent {
        let order = Order::place(
            UserId::new(1),
            vec![OrderItem::new(7, 2, Money::from_minor(1000), "Widget", "u")],
            "card",
            "addr",
        );
        OrderPlacedEvent::from_order(&order)
    }

    #[tokio::test]
    async fn test_publish_routes_to_bound_queue_and_confirms() {
        let broker = InMemoryBroker::with_order_topology().await;

        let correlation_id = broker.publish(&sample_event()).await.unwrap();

        assert_eq!(broker.queue_len(ORDER_PLACED_QUEUE_NAME).await, 1);
        assert!(broker.is_confirmed(&correlation_id).await);
        assert!(broker.returns().await.is_empty());

        let delivery = broker.pop_delivery(ORDER_PLACED_QUEUE_NAME).await.unwrap();
        assert_eq!(delivery.correlation_id, correlation_id);
        assert_eq!(delivery.routing_key, ORDER_PLACED_ROUTING_KEY);
        assert_eq!(delivery.payload["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_publish_without_binding_records_return() {
        let broker = InMemoryBroker::new();

        let correlation_id = broker.publish(&sample_event()).await.unwrap();

        // Confirmed by the broker but returned as unroutable
        assert!(broker.is_confirmed(&correlation_id).await);
        let returns = broker.returns().await;
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].correlation_id, correlation_id);
        assert_eq!(returns[0].routing_key, ORDER_PLACED_ROUTING_KEY);
    }

    #[tokio::test]
    async fn test_send_time_failure_surfaces_error_without_confirm() {
        let broker = InMemoryBroker::with_order_topology().await;
        broker.set_fail_on_publish(true).await;

        let result = broker.publish(&sample_event()).await;
        assert!(matches!(result, Err(PublishError::Disconnected(_))));
        assert!(broker.confirms().await.is_empty());
        assert_eq!(broker.queue_len(ORDER_PLACED_QUEUE_NAME).await, 0);
    }

    #[tokio::test]
    async fn test_each_publish_gets_unique_correlation_id() {
        let broker = InMemoryBroker::with_order_topology().await;
        let a = broker.publish(&sample_event()).await.unwrap();
        let b = broker.publish(&sample_event()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(broker.confirms().await.len(), 2);
    }

    #[tokio::test]
    async fn test_requeue_bumps_redelivery_count() {
        let broker = InMemoryBroker::with_order_topology().await;
        broker.publish(&sample_event()).await.unwrap();

        let delivery = broker.pop_delivery(ORDER_PLACED_QUEUE_NAME).await.unwrap();
        broker.requeue(ORDER_PLACED_QUEUE_NAME, delivery).await;

        let redelivered = broker.pop_delivery(ORDER_PLACED_QUEUE_NAME).await.unwrap();
        assert_eq!(redelivered.redelivery_count, 1);
    }
}
