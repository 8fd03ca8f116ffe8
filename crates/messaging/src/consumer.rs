//! Idempotent event consumption (notification side).

use std::sync::Arc;

use async_trait::async_trait;
use domain::OrderPlacedEvent;
use tokio::sync::RwLock;

use crate::dedup::DedupStore;
use crate::publisher::{Delivery, InMemoryBroker};

/// What a consumer wants done with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Processing finished (including benign duplicate skips); acknowledge.
    Ack,
    /// Transient failure; the message should be redelivered.
    Retry,
    /// Permanent failure; route to the dead-letter path, do not requeue.
    DeadLetter,
}

/// A queue consumer.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Handles one delivery and reports its disposition.
    async fn handle(&self, delivery: &Delivery) -> ConsumeOutcome;
}

#[derive(Default)]
struct ListenerState {
    notified_orders: Vec<String>,
    fail_transient: bool,
    fail_permanent: bool,
}

/// Consumer for order-placed events.
///
/// Delivery is at-least-once: the same order id can arrive more than once
/// through broker redelivery or the paid-transition republish. Duplicates
/// are detected through the [`DedupStore`] before any side effect runs and
/// acknowledged without reprocessing.
pub struct OrderEventListener<D: DedupStore> {
    dedup: D,
    state: Arc<RwLock<ListenerState>>,
}

impl<D: DedupStore> OrderEventListener<D> {
    /// Creates a listener backed by the given dedup store.
    pub fn new(dedup: D) -> Self {
        Self {
            dedup,
            state: Arc::new(RwLock::new(ListenerState::default())),
        }
    }

    /// Order numbers for which a notification was actually sent.
    pub async fn notified_orders(&self) -> Vec<String> {
        self.state.read().await.notified_orders.clone()
    }

    /// Simulates a transient processing failure on the next delivery.
    pub async fn set_fail_transient(&self, fail: bool) {
        self.state.write().await.fail_transient = fail;
    }

    /// Simulates an unrecoverable processing failure.
    pub async fn set_fail_permanent(&self, fail: bool) {
        self.state.write().await.fail_permanent = fail;
    }
}

#[async_trait]
impl<D: DedupStore> EventListener for OrderEventListener<D> {
    async fn handle(&self, delivery: &Delivery) -> ConsumeOutcome {
        let event: OrderPlacedEvent = match serde_json::from_value(delivery.payload.clone()) {
            Ok(event) => event,
            Err(e) => {
                // A payload that cannot be parsed never will be; requeuing
                // would loop forever.
                tracing::error!(
                    correlation_id = %delivery.correlation_id,
                    error = %e,
                    "undecodable event payload, dead-lettering"
                );
                return ConsumeOutcome::DeadLetter;
            }
        };

        if self.dedup.seen(event.order_id).await {
            tracing::warn!(
                order_id = %event.order_id,
                "order already processed, skipping duplicate event"
            );
            metrics::counter!("consumer_duplicates_total").increment(1);
            return ConsumeOutcome::Ack;
        }

        {
            let state = self.state.read().await;
            if state.fail_permanent {
                return ConsumeOutcome::DeadLetter;
            }
            if state.fail_transient {
                return ConsumeOutcome::Retry;
            }
        }

        // Notification side effect. Formatting and transport live in the
        // notification service; here the send is represented by a log line.
        tracing::info!(
            order_id = %event.order_id,
            order_number = %event.order_number,
            user_id = %event.user_id,
            total = %event.total_amount,
            status = %event.status,
            items = event.items.len(),
            "sending order notification"
        );
        metrics::counter!("consumer_notifications_total").increment(1);

        self.state
            .write()
            .await
            .notified_orders
            .push(event.order_number.clone());
        self.dedup.mark_seen(event.order_id).await;

        ConsumeOutcome::Ack
    }
}

/// Drains a queue through a listener, applying redelivery semantics.
///
/// `Retry` requeues the message until `max_redeliveries` is reached, after
/// which it is dead-lettered rather than requeued indefinitely. Returns
/// the number of acknowledged deliveries.
pub async fn drain_queue<L: EventListener>(
    broker: &InMemoryBroker,
    queue: &str,
    listener: &L,
    max_redeliveries: u32,
) -> usize {
    let mut acked = 0;
    while let Some(delivery) = broker.pop_delivery(queue).await {
        match listener.handle(&delivery).await {
            ConsumeOutcome::Ack => acked += 1,
            ConsumeOutcome::Retry => {
                if delivery.redelivery_count >= max_redeliveries {
                    tracing::error!(
                        correlation_id = %delivery.correlation_id,
                        redeliveries = delivery.redelivery_count,
                        "redelivery limit reached, dead-lettering"
                    );
                    broker.dead_letter(delivery).await;
                } else {
                    broker.requeue(queue, delivery).await;
                }
            }
            ConsumeOutcome::DeadLetter => broker.dead_letter(delivery).await,
        }
    }
    acked
}
