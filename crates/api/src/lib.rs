//! HTTP API server for the order service.
//!
//! Exposes order placement, queries, status updates, payment initiation
//! and the gateway webhook endpoint, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use messaging::InMemoryBroker;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestration::{
    InMemoryCartClient, InMemoryInventoryClient, InMemoryPaymentGateway, OrchestratorConfig,
    OrderOrchestrator,
};
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders", get(routes::orders::search::<S>))
        .route(
            "/orders/from-cart/{user_id}",
            post(routes::orders::place_from_cart::<S>),
        )
        .route("/orders/user/{user_id}", get(routes::orders::list_for_user::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", delete(routes::orders::delete::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route(
            "/orders/{id}/payment",
            post(routes::orders::initiate_payment::<S>),
        )
        .route("/webhooks/payment", post(routes::webhooks::receive::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store, wiring in-memory clients
/// for the inventory, cart, payment gateway and broker.
pub async fn create_default_state<S: OrderStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let inventory = InMemoryInventoryClient::new();
    let cart = InMemoryCartClient::new();
    let gateway = InMemoryPaymentGateway::new();
    let broker = InMemoryBroker::with_order_topology().await;

    let orchestrator = OrderOrchestrator::with_config(
        store,
        inventory.clone(),
        cart.clone(),
        gateway,
        broker.clone(),
        OrchestratorConfig {
            webhook_secret: config.webhook_secret.clone(),
            dependency_timeout: config.dependency_timeout,
            currency: config.currency.clone(),
        },
    );

    Arc::new(AppState {
        orchestrator,
        inventory,
        cart,
        broker,
    })
}
