//! Order placement, query, status and payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Order, OrderStatus, PlaceOrderRequest};
use messaging::InMemoryBroker;
use orchestration::{
    InMemoryCartClient, InMemoryInventoryClient, InMemoryPaymentGateway, OrderOrchestrator,
    PaymentInitiation,
};
use order_store::{OrderFilter, OrderStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// The external service clients are held alongside the orchestrator so
/// tests and local tooling can seed catalog stock and inspect the broker.
pub struct AppState<S: OrderStore> {
    pub orchestrator: OrderOrchestrator<
        S,
        InMemoryInventoryClient,
        InMemoryCartClient,
        InMemoryPaymentGateway,
        InMemoryBroker,
    >,
    pub inventory: InMemoryInventoryClient,
    pub cart: InMemoryCartClient,
    pub broker: InMemoryBroker,
}

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize, Default)]
pub struct SearchParams {
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub quantity: u32,
    pub price_at_purchase_minor: i64,
    pub product_name: String,
    pub image_url: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: i64,
    pub order_number: String,
    pub status: String,
    pub total_amount_minor: i64,
    pub payment_info: String,
    pub shipping_address: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.as_i64(),
                quantity: item.quantity,
                price_at_purchase_minor: item.price_at_purchase.minor(),
                product_name: item.product_name.clone(),
                image_url: item.image_url.clone(),
            })
            .collect();

        OrderResponse {
            id: order.id.to_string(),
            user_id: order.user_id.as_i64(),
            order_number: order.order_number.as_str().to_string(),
            status: order.status.as_str().to_string(),
            total_amount_minor: order.total_amount.minor(),
            payment_info: order.payment_info,
            shipping_address: order.shipping_address,
            gateway_order_id: order.gateway_order_id,
            gateway_payment_id: order.gateway_payment_id,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items,
        }
    }
}

// -- Handlers --

/// POST /orders — place an order from explicit line items.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.orchestrator.place_order(req).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// POST /orders/from-cart/:user_id — place an order from the user's cart.
#[tracing::instrument(skip(state))]
pub async fn place_from_cart<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<i64>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .orchestrator
        .place_order_from_cart(UserId::new(user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — fetch a single order.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orchestrator.get_order(parse_order_id(&id)?).await?;
    Ok(Json(order.into()))
}

/// GET /orders/user/:user_id — list a user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .orchestrator
        .list_orders_for_user(UserId::new(user_id))
        .await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders — search orders by status and creation time range.
///
/// All parameters are optional; a bare request lists everything.
#[tracing::instrument(skip(state, params))]
pub async fn search<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let mut filter = OrderFilter::new();
    if let Some(status) = &params.status {
        let status = OrderStatus::parse(status)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        filter = filter.with_status(status);
    }
    if let Some(from) = params.from {
        filter = filter.created_from(from);
    }
    if let Some(to) = params.to {
        filter = filter.created_to(to);
    }

    let orders = state.orchestrator.search_orders(&filter).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// PUT /orders/:id/status — set an order's status by wire name.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orchestrator
        .update_status(parse_order_id(&id)?, &req.status)
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/:id — hard-delete an order and its items.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.delete_order(parse_order_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /orders/:id/payment — create a gateway payment order.
#[tracing::instrument(skip(state))]
pub async fn initiate_payment<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentInitiation>, ApiError> {
    let initiation = state
        .orchestrator
        .initiate_payment(parse_order_id(&id)?)
        .await?;
    Ok(Json(initiation))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID format: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
