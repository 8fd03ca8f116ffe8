//! Payment gateway webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use orchestration::WebhookDisposition;
use order_store::OrderStore;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Header carrying the hex HMAC-SHA256 signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// POST /webhooks/payment — receives payment lifecycle events from the
/// gateway.
///
/// The handler works on the raw body bytes so the signature is checked
/// against exactly what was sent. Unknown event types and unknown gateway
/// order IDs are acknowledged with 200 so the gateway stops retrying.
#[tracing::instrument(skip_all)]
pub async fn receive<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthorized(format!("Missing {SIGNATURE_HEADER} header"))
        })?;

    let disposition = state.orchestrator.handle_webhook(&body, signature).await?;

    let status = match disposition {
        WebhookDisposition::Updated { .. } => "processed",
        WebhookDisposition::UnknownOrder | WebhookDisposition::Ignored => "ignored",
    };
    Ok(Json(WebhookResponse { status }))
}
