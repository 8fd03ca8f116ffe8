//! Payment gateway webhook parsing and signature verification.
//!
//! The gateway signs every webhook delivery with an HMAC-SHA256 of the raw
//! request body, hex-encoded, carried in a signature header. Verification
//! must run against the exact bytes received, before any JSON parsing.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::error::{OrchestrationError, Result};
use domain::OrderStatus;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a webhook signature against the raw request body.
///
/// The comparison is constant-time. Returns false for malformed hex as
/// well as for a genuine mismatch.
pub fn verify_signature(payload: &[u8], signature_hex: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Computes the hex signature the gateway would attach to `payload`.
///
/// Used by tests and local tooling to fabricate valid deliveries.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Payment-lifecycle event kinds the orchestrator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventKind {
    PaymentAuthorized,
    PaymentCaptured,
    PaymentFailed,
    OrderPaid,
    RefundProcessed,
}

impl WebhookEventKind {
    /// The order status this event transitions the order to.
    pub fn target_status(self) -> OrderStatus {
        match self {
            WebhookEventKind::PaymentAuthorized => OrderStatus::Authorized,
            WebhookEventKind::PaymentCaptured | WebhookEventKind::OrderPaid => OrderStatus::Paid,
            WebhookEventKind::PaymentFailed => OrderStatus::Failed,
            WebhookEventKind::RefundProcessed => OrderStatus::Refunded,
        }
    }
}

/// A parsed, recognized webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// What happened on the gateway.
    pub kind: WebhookEventKind,
    /// The gateway's payment-order identifier, used to find our order.
    pub gateway_order_id: String,
    /// The gateway's payment identifier, when the event carries one.
    pub gateway_payment_id: Option<String>,
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Parses a webhook body into an event.
///
/// Returns `Ok(None)` for event types we do not handle and for recognized
/// events whose payload is missing the order reference; both are benign
/// no-ops on a shared webhook endpoint. Only an unparseable body is an
/// error.
pub fn parse_event(raw_body: &[u8]) -> Result<Option<WebhookEvent>> {
    let body: Value = serde_json::from_slice(raw_body)
        .map_err(|e| OrchestrationError::InvalidArgument(format!("Malformed webhook body: {e}")))?;

    let Some(event_type) = body.get("event").and_then(Value::as_str) else {
        return Err(OrchestrationError::InvalidArgument(
            "Webhook body has no event field".to_string(),
        ));
    };

    let kind = match event_type {
        "payment.authorized" => WebhookEventKind::PaymentAuthorized,
        "payment.captured" => WebhookEventKind::PaymentCaptured,
        "payment.failed" => WebhookEventKind::PaymentFailed,
        "order.paid" => WebhookEventKind::OrderPaid,
        "refund.processed" => WebhookEventKind::RefundProcessed,
        other => {
            tracing::debug!(event_type = other, "ignoring unhandled webhook event type");
            return Ok(None);
        }
    };

    let entity = &body["payload"]["payment"]["entity"];

    // The order reference lives in different places per event shape:
    // payment events carry order_id directly, order.paid events are keyed
    // by the order entity itself with payments nested under it.
    let (gateway_order_id, gateway_payment_id) = match kind {
        WebhookEventKind::PaymentAuthorized
        | WebhookEventKind::PaymentCaptured
        | WebhookEventKind::PaymentFailed => (str_field(entity, "order_id"), str_field(entity, "id")),
        WebhookEventKind::OrderPaid => {
            let order_entity = &body["payload"]["order"]["entity"];
            let payment_id = order_entity
                .get("payments")
                .and_then(|p| p.get(0))
                .and_then(|p| str_field(p, "id"));
            (str_field(order_entity, "id"), payment_id)
        }
        WebhookEventKind::RefundProcessed => {
            let refund_entity = &body["payload"]["refund"]["entity"];
            (
                str_field(refund_entity, "order_id"),
                str_field(refund_entity, "payment_id"),
            )
        }
    };

    let Some(gateway_order_id) = gateway_order_id else {
        tracing::warn!(
            event_type,
            "webhook event carries no gateway order id, skipping"
        );
        return Ok(None);
    };

    Ok(Some(WebhookEvent {
        kind,
        gateway_order_id,
        gateway_payment_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign(body, "whsec_test");
        assert!(verify_signature(body, &sig, "whsec_test"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign(body, "whsec_test");
        assert!(!verify_signature(body, &sig, "whsec_other"));
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign(body, "whsec_test");
        assert!(!verify_signature(br#"{"event":"payment.failed"}"#, &sig, "whsec_test"));
    }

    #[test]
    fn test_verify_rejects_malformed_hex() {
        assert!(!verify_signature(b"{}", "not-hex!", "whsec_test"));
    }

    #[test]
    fn test_parse_payment_captured() {
        let body = serde_json::json!({
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": { "id": "pay_123", "order_id": "order_456" }
                }
            }
        });
        let event = parse_event(body.to_string().as_bytes()).unwrap().unwrap();
        assert_eq!(event.kind, WebhookEventKind::PaymentCaptured);
        assert_eq!(event.gateway_order_id, "order_456");
        assert_eq!(event.gateway_payment_id.as_deref(), Some("pay_123"));
        assert_eq!(event.kind.target_status(), OrderStatus::Paid);
    }

    #[test]
    fn test_parse_order_paid_nested_payments() {
        let body = serde_json::json!({
            "event": "order.paid",
            "payload": {
                "order": {
                    "entity": {
                        "id": "order_456",
                        "payments": [{ "id": "pay_123" }]
                    }
                }
            }
        });
        let event = parse_event(body.to_string().as_bytes()).unwrap().unwrap();
        assert_eq!(event.kind, WebhookEventKind::OrderPaid);
        assert_eq!(event.gateway_order_id, "order_456");
        assert_eq!(event.gateway_payment_id.as_deref(), Some("pay_123"));
    }

    #[test]
    fn test_parse_refund_processed() {
        let body = serde_json::json!({
            "event": "refund.processed",
            "payload": {
                "refund": {
                    "entity": { "id": "rfnd_1", "order_id": "order_456", "payment_id": "pay_123" }
                }
            }
        });
        let event = parse_event(body.to_string().as_bytes()).unwrap().unwrap();
        assert_eq!(event.kind, WebhookEventKind::RefundProcessed);
        assert_eq!(event.kind.target_status(), OrderStatus::Refunded);
    }

    #[test]
    fn test_parse_unknown_event_is_none() {
        let body = serde_json::json!({ "event": "invoice.generated", "payload": {} });
        assert!(parse_event(body.to_string().as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_parse_missing_order_id_is_none() {
        let body = serde_json::json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": { "id": "pay_123" } } }
        });
        assert!(parse_event(body.to_string().as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_parse_malformed_body_errors() {
        let result = parse_event(b"not json");
        assert!(matches!(
            result,
            Err(OrchestrationError::InvalidArgument(_))
        ));
    }
}
