//! Pluggable deduplication store for idempotent consumption.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

/// Records which order ids a consumer has already processed.
///
/// Delivery is at-least-once, so consumers must check `seen` before
/// performing side effects and `mark_seen` after completing them. The
/// interface is deliberately minimal so a persisted or distributed
/// implementation can replace the in-memory one without touching consumer
/// logic.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Returns true if the order id has already been processed.
    async fn seen(&self, order_id: OrderId) -> bool;

    /// Marks the order id as processed.
    async fn mark_seen(&self, order_id: OrderId);
}

/// In-memory dedup store.
///
/// Suitable only for a single-process consumer that never restarts; the
/// set is lost on restart, after which duplicates would be reprocessed.
/// Production deployments need a persisted store behind this trait.
#[derive(Clone, Default)]
pub struct InMemoryDedupStore {
    processed: Arc<RwLock<HashSet<OrderId>>>,
}

impl InMemoryDedupStore {
    /// Creates an empty dedup store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ids marked as processed.
    pub async fn len(&self) -> usize {
        self.processed.read().await.len()
    }

    /// True if no ids have been marked.
    pub async fn is_empty(&self) -> bool {
        self.processed.read().await.is_empty()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn seen(&self, order_id: OrderId) -> bool {
        self.processed.read().await.contains(&order_id)
    }

    async fn mark_seen(&self, order_id: OrderId) {
        self.processed.write().await.insert(order_id);
    }
}
