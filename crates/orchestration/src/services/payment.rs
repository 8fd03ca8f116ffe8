//! Payment gateway client trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;

use crate::error::OrchestrationError;

/// A payment order created on the gateway's side.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    /// The gateway's identifier for the payment order.
    pub gateway_order_id: String,
}

/// Trait for the external payment gateway.
///
/// `receipt` is the merchant-side reference (the order number), which the
/// gateway echoes back and which makes retried creations traceable.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment order on the gateway for the given amount.
    async fn create_payment_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, OrchestrationError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    created: Vec<(String, i64, String)>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail creation calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of payment orders created so far.
    pub fn created_count(&self) -> usize {
        self.state.read().unwrap().created.len()
    }

    /// Returns the (id, amount in minor units, receipt) triples recorded.
    pub fn created_orders(&self) -> Vec<(String, i64, String)> {
        self.state.read().unwrap().created.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_payment_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, OrchestrationError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(OrchestrationError::DependencyFailure(format!(
                "Payment gateway rejected order creation ({currency})"
            )));
        }

        state.next_id += 1;
        let gateway_order_id = format!("pay_order_{:04}", state.next_id);
        state
            .created
            .push((gateway_order_id.clone(), amount.minor(), receipt.to_string()));

        Ok(GatewayOrder { gateway_order_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_payment_order() {
        let gateway = InMemoryPaymentGateway::new();

        let created = gateway
            .create_payment_order(Money::from_minor(2000), "INR", "ORD-abc")
            .await
            .unwrap();

        assert_eq!(created.gateway_order_id, "pay_order_0001");
        assert_eq!(
            gateway.created_orders(),
            vec![("pay_order_0001".to_string(), 2000, "ORD-abc".to_string())]
        );
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_create(true);

        let result = gateway
            .create_payment_order(Money::from_minor(100), "INR", "ORD-x")
            .await;
        assert!(matches!(
            result,
            Err(OrchestrationError::DependencyFailure(_))
        ));
        assert_eq!(gateway.created_count(), 0);
    }
}
