//! The order orchestrator.
//!
//! Coordinates the inventory, cart and payment gateway clients, the order
//! store, and the event publisher to run the order lifecycle: placement
//! with stock reservation, payment initiation, and gateway webhook
//! handling.

use std::time::Duration;

use common::{OrderId, UserId};
use domain::{
    Money, Order, OrderItem, OrderNumber, OrderPlacedEvent, OrderStatus, PlaceOrderRequest,
    ProductId, validate_place_order,
};
use messaging::EventPublisher;
use order_store::{OrderFilter, OrderStore};
use serde::Serialize;

use crate::error::{OrchestrationError, Result};
use crate::services::{CartClient, InventoryClient, PaymentGateway};
use crate::webhook;

/// Placement and shipping defaults recorded when the caller supplies none.
const DIRECT_ORDER_PLACEHOLDER: &str = "N/A - Direct Order";
const CART_PAYMENT_INFO: &str = "Online Payment - Cart";

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// Upper bound on any single outbound service call.
    pub dependency_timeout: Duration,
    /// Currency code passed to the payment gateway.
    pub currency: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            webhook_secret: "whsec_dev".to_string(),
            dependency_timeout: Duration::from_secs(5),
            currency: "INR".to_string(),
        }
    }
}

/// Data the storefront needs to open a gateway checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

/// Outcome of processing a verified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The referenced order was transitioned to the given status.
    Updated {
        order_id: OrderId,
        status: OrderStatus,
    },
    /// The gateway order ID matched no order of ours; acknowledged anyway.
    UnknownOrder,
    /// Event type not handled, or payload carried no order reference.
    Ignored,
}

/// Coordinates order placement, payment and webhook-driven updates.
pub struct OrderOrchestrator<S, I, C, P, E>
where
    S: OrderStore,
    I: InventoryClient,
    C: CartClient,
    P: PaymentGateway,
    E: EventPublisher,
{
    store: S,
    inventory: I,
    cart: C,
    gateway: P,
    publisher: E,
    config: OrchestratorConfig,
}

impl<S, I, C, P, E> OrderOrchestrator<S, I, C, P, E>
where
    S: OrderStore,
    I: InventoryClient,
    C: CartClient,
    P: PaymentGateway,
    E: EventPublisher,
{
    /// Creates a new orchestrator over the given collaborators.
    pub fn new(store: S, inventory: I, cart: C, gateway: P, publisher: E) -> Self {
        Self::with_config(
            store,
            inventory,
            cart,
            gateway,
            publisher,
            OrchestratorConfig::default(),
        )
    }

    /// Creates a new orchestrator with explicit configuration.
    pub fn with_config(
        store: S,
        inventory: I,
        cart: C,
        gateway: P,
        publisher: E,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            inventory,
            cart,
            gateway,
            publisher,
            config,
        }
    }

    /// Bounds an outbound service call by the configured timeout.
    async fn bounded<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.dependency_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(OrchestrationError::DependencyFailure(format!(
                "{what} timed out after {:?}",
                self.config.dependency_timeout
            ))),
        }
    }

    /// Reserves stock for one line, returning the snapshotted order item.
    ///
    /// The declared `price` is authoritative for the order total; a catalog
    /// price that disagrees is logged but not substituted.
    async fn reserve_line(
        &self,
        product_id: ProductId,
        quantity: u32,
        price: Money,
    ) -> Result<OrderItem> {
        let product = self
            .bounded("inventory get_product", self.inventory.get_product(product_id))
            .await?;

        if product.price != price {
            tracing::warn!(
                %product_id,
                declared = %price,
                catalog = %product.price,
                "price mismatch between request and catalog, keeping declared price"
            );
        }

        self.bounded(
            "inventory reserve_stock",
            self.inventory.reserve_stock(product_id, quantity),
        )
        .await?;

        Ok(OrderItem::new(
            product_id,
            quantity,
            price,
            product.name,
            product.image_url.unwrap_or_default(),
        ))
    }

    /// Best-effort release of reservations made before a placement failed.
    /// Failures here are logged; the original error is what the caller sees.
    async fn release_reserved(&self, reserved: &[(ProductId, u32)]) {
        for &(product_id, quantity) in reserved {
            let result = self
                .bounded(
                    "inventory release_stock",
                    self.inventory.release_stock(product_id, quantity),
                )
                .await;
            if let Err(e) = result {
                tracing::error!(%product_id, quantity, error = %e, "failed to release reserved stock");
            }
        }
    }

    /// Publishes the order-placed event. The order is already persisted, so
    /// a publish failure is logged and swallowed rather than surfaced.
    async fn publish_placed_event(&self, order: &Order) {
        let event = OrderPlacedEvent::from_order(order);
        match self.publisher.publish(&event).await {
            Ok(correlation_id) => {
                tracing::debug!(order_id = %order.id, correlation_id, "published order-placed event");
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %e,
                    "failed to publish order-placed event, order remains persisted"
                );
            }
        }
    }

    /// Places an order from explicit line items.
    ///
    /// Stock is reserved line by line; if any line fails, reservations made
    /// for earlier lines are released and no order is written.
    #[tracing::instrument(skip(self, request), fields(user_id = request.user_id))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order> {
        validate_place_order(&request)?;

        let user_id = UserId::new(request.user_id);
        let mut reserved: Vec<(ProductId, u32)> = Vec::new();
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            match self
                .reserve_line(line.product_id, line.quantity, line.price_at_purchase)
                .await
            {
                Ok(item) => {
                    reserved.push((line.product_id, line.quantity));
                    items.push(item);
                }
                Err(e) => {
                    self.release_reserved(&reserved).await;
                    return Err(e);
                }
            }
        }

        let order = Order::place(
            user_id,
            items,
            request
                .payment_info
                .unwrap_or_else(|| DIRECT_ORDER_PLACEHOLDER.to_string()),
            request
                .shipping_address
                .unwrap_or_else(|| DIRECT_ORDER_PLACEHOLDER.to_string()),
        );

        if let Err(e) = self.store.insert(&order).await {
            self.release_reserved(&reserved).await;
            return Err(e.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, order_number = %order.order_number, "order placed");

        self.publish_placed_event(&order).await;
        Ok(order)
    }

    /// Places an order from the user's shopping cart, then clears the cart.
    ///
    /// Cart prices are authoritative for the order total. A cart-clear
    /// failure after the order is persisted is logged and swallowed.
    #[tracing::instrument(skip(self))]
    pub async fn place_order_from_cart(&self, user_id: UserId) -> Result<Order> {
        let cart = self
            .bounded("cart get_cart", self.cart.get_cart(user_id))
            .await?;

        if cart.items.is_empty() {
            return Err(OrchestrationError::NotFound(format!(
                "Cart is empty for user: {user_id}"
            )));
        }

        let mut reserved: Vec<(ProductId, u32)> = Vec::new();
        let mut items = Vec::with_capacity(cart.items.len());

        for line in &cart.items {
            match self
                .reserve_line(line.product_id, line.quantity, line.price)
                .await
            {
                Ok(item) => {
                    reserved.push((line.product_id, line.quantity));
                    items.push(item);
                }
                Err(e) => {
                    self.release_reserved(&reserved).await;
                    return Err(e);
                }
            }
        }

        let order = Order::place(
            user_id,
            items,
            CART_PAYMENT_INFO,
            format!("Default shipping address for user {user_id}"),
        );

        if let Err(e) = self.store.insert(&order).await {
            self.release_reserved(&reserved).await;
            return Err(e.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, order_number = %order.order_number, "order placed from cart");

        let clear = self
            .bounded("cart clear_cart", self.cart.clear_cart(user_id))
            .await;
        if let Err(e) = clear {
            tracing::error!(%user_id, error = %e, "failed to clear cart after checkout");
        }

        self.publish_placed_event(&order).await;
        Ok(order)
    }

    /// Fetches a single order by ID.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.store.get(id).await?.ok_or_else(|| {
            OrchestrationError::NotFound(format!("Order not found with id: {id}"))
        })
    }

    /// Lists a user's orders, newest first.
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    /// Lists orders matching the filter, newest first.
    pub async fn search_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        Ok(self.store.search(filter).await?)
    }

    /// Sets an order's status from its wire name.
    ///
    /// Setting the status an order already has is a no-op that leaves the
    /// record untouched. Transitioning an order to `PAID` through this path
    /// republishes the order-placed event for downstream consumers.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order> {
        let new_status = OrderStatus::parse(status)?;
        let mut order = self.get_order(id).await?;

        if order.status == new_status {
            return Ok(order);
        }

        let previous = order.status;
        order.set_status(new_status);
        self.store.update(&order).await?;

        tracing::info!(order_id = %id, from = %previous, to = %new_status, "order status updated");

        if new_status == OrderStatus::Paid && previous != OrderStatus::Paid {
            self.publish_placed_event(&order).await;
        }

        Ok(order)
    }

    /// Hard-deletes an order and its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Creates a payment order on the gateway for an existing order.
    ///
    /// Only orders that have not progressed past payment may initiate; the
    /// order moves to `PENDING_PAYMENT` and remembers the gateway order ID
    /// so the webhook can find it later.
    #[tracing::instrument(skip(self))]
    pub async fn initiate_payment(&self, id: OrderId) -> Result<PaymentInitiation> {
        let mut order = self.get_order(id).await?;

        if !order.status.can_initiate_payment() {
            return Err(OrchestrationError::InvalidArgument(format!(
                "Cannot initiate payment for order in status {}",
                order.status
            )));
        }

        let created = self
            .bounded(
                "gateway create_payment_order",
                self.gateway.create_payment_order(
                    order.total_amount,
                    &self.config.currency,
                    order.order_number.as_str(),
                ),
            )
            .await?;

        order.attach_gateway_order(created.gateway_order_id.clone());
        self.store.update(&order).await?;

        metrics::counter!("payment_initiations_total").increment(1);
        tracing::info!(
            order_id = %id,
            gateway_order_id = created.gateway_order_id,
            "payment initiated"
        );

        // TODO: read checkout prefill from the user profile service once it
        // exposes contact details; until then the prefill is synthesized.
        let user = order.user_id;
        Ok(PaymentInitiation {
            order_id: order.id,
            order_number: order.order_number,
            gateway_order_id: created.gateway_order_id,
            amount: order.total_amount,
            currency: self.config.currency.clone(),
            customer_name: format!("Customer {user}"),
            customer_email: format!("customer{user}@example.com"),
            customer_phone: "9999999999".to_string(),
        })
    }

    /// Processes a gateway webhook delivery.
    ///
    /// The signature is verified against the raw body before anything else;
    /// a bad signature is `Unauthorized` and mutates nothing. Unhandled
    /// event types and unknown gateway order IDs are acknowledged without
    /// effect so the gateway does not retry them. An order that newly
    /// enters `PAID` here gets its order-placed event republished.
    #[tracing::instrument(skip_all)]
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<WebhookDisposition> {
        if !webhook::verify_signature(raw_body, signature, &self.config.webhook_secret) {
            metrics::counter!("webhook_signature_failures_total").increment(1);
            return Err(OrchestrationError::Unauthorized(
                "Webhook signature verification failed".to_string(),
            ));
        }

        let Some(event) = webhook::parse_event(raw_body)? else {
            return Ok(WebhookDisposition::Ignored);
        };

        let Some(mut order) = self
            .store
            .get_by_gateway_order_id(&event.gateway_order_id)
            .await?
        else {
            tracing::warn!(
                gateway_order_id = event.gateway_order_id,
                "webhook references unknown gateway order, acknowledging"
            );
            return Ok(WebhookDisposition::UnknownOrder);
        };

        let previous = order.status;
        let new_status = event.kind.target_status();
        order.record_payment_outcome(new_status, event.gateway_payment_id);
        self.store.update(&order).await?;

        metrics::counter!("webhook_events_total", "status" => new_status.as_str()).increment(1);
        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %new_status,
            "webhook applied to order"
        );

        if new_status == OrderStatus::Paid && previous != OrderStatus::Paid {
            self.publish_placed_event(&order).await;
        }

        Ok(WebhookDisposition::Updated {
            order_id: order.id,
            status: new_status,
        })
    }
}
