//! # Stripe Webhook Handling
//!
//! Signature verification and event dispatch for inbound Stripe webhooks.
//! Events are trusted only after the signature over the raw body checks out
//! against the shared signing secret.

use async_trait::async_trait;
use chrono::Utc;
use payroute_core::{PaymentError, PaymentResult};
use serde::Deserialize;
use tracing::{debug, warn};

/// Signature timestamp tolerance, seconds
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Webhook event types this layer interprets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// payment_intent.succeeded
    PaymentSucceeded,
    /// payment_intent.payment_failed
    PaymentFailed,
    /// Anything else (logged and ignored)
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone)]
pub struct StripeEvent {
    pub event_id: String,
    pub event_type: WebhookEventType,
    pub created: i64,
    /// The `data.object` payload (a payment intent for the types we handle)
    pub object: serde_json::Map<String, serde_json::Value>,
}

/// Fields extracted from a payment intent carried in an event
#[derive(Debug, Clone)]
pub struct PaymentIntentData {
    pub intent_id: String,
    /// Caller id attached as metadata when the intent was created
    pub user_id: Option<String>,
    pub amount: Option<i64>,
    /// Vendor failure detail (present on payment_failed events)
    pub failure_message: Option<String>,
}

impl PaymentIntentData {
    /// Extract from a verified event's `data.object`
    pub fn from_event(event: &StripeEvent) -> PaymentResult<Self> {
        let intent_id = event
            .object
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| PaymentError::WebhookParse("Missing intent id".to_string()))?;

        let user_id = event
            .object
            .get("metadata")
            .and_then(|m| m.get("user_id"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let amount = event.object.get("amount").and_then(|v| v.as_i64());

        let failure_message = event
            .object
            .get("last_payment_error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(Self {
            intent_id,
            user_id,
            amount,
            failure_message,
        })
    }
}

/// Verify a webhook signature and parse the event.
///
/// The signature header carries `t=<unix ts>,v1=<hex hmac>[,v1=...]`; the
/// HMAC-SHA256 is computed over `"{t}.{raw_body}"` with the signing secret.
pub fn verify_event(secret: &str, payload: &[u8], signature: &str) -> PaymentResult<StripeEvent> {
    let sig_parts = parse_signature_header(signature)?;

    let now = Utc::now().timestamp();
    if (now - sig_parts.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(PaymentError::WebhookVerification(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload = format!(
        "{}.{}",
        sig_parts.timestamp,
        String::from_utf8_lossy(payload)
    );
    let expected_sig = compute_hmac_sha256(secret, &signed_payload);

    let valid = sig_parts
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected_sig));

    if !valid {
        return Err(PaymentError::WebhookVerification(
            "Signature mismatch".to_string(),
        ));
    }

    let event: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| PaymentError::WebhookParse(format!("Failed to parse webhook: {}", e)))?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    let event_type = match event.event_type.as_str() {
        "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
        "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
        other => WebhookEventType::Unknown(other.to_string()),
    };

    Ok(StripeEvent {
        event_id: event.id,
        event_type,
        created: event.created,
        object: event.data.object,
    })
}

/// Webhook event handler seam.
///
/// The success hook receives the parsed intent; the failure hook receives the
/// failure data and by default only logs it (no remediation, no record).
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn on_payment_succeeded(&self, data: PaymentIntentData) -> PaymentResult<()>;

    async fn on_payment_failed(&self, data: PaymentIntentData) -> PaymentResult<()> {
        warn!(
            "Payment failed: intent={}, detail={}",
            data.intent_id,
            data.failure_message.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }

    async fn on_unknown_event(&self, event: &StripeEvent) -> PaymentResult<()> {
        debug!("Unhandled webhook event: {:?}", event.event_type);
        Ok(())
    }
}

/// Dispatch a verified event to the appropriate handler method
pub async fn dispatch_event(handler: &dyn WebhookHandler, event: StripeEvent) -> PaymentResult<()> {
    match &event.event_type {
        WebhookEventType::PaymentSucceeded => {
            let data = PaymentIntentData::from_event(&event)?;
            handler.on_payment_succeeded(data).await
        }
        WebhookEventType::PaymentFailed => {
            let data = PaymentIntentData::from_event(&event)?;
            handler.on_payment_failed(data).await
        }
        WebhookEventType::Unknown(_) => handler.on_unknown_event(&event).await,
    }
}

// =============================================================================
// Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerification("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerification(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// HMAC-SHA256 over the signed payload, hex-encoded.
/// Public so tests and tooling can mint valid signatures.
pub fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Build a signed payload the way Stripe does
    fn sign(secret: &str, payload: &str, timestamp: i64) -> String {
        let sig = compute_hmac_sha256(secret, &format!("{}.{}", timestamp, payload));
        format!("t={},v1={}", timestamp, sig)
    }

    fn succeeded_payload() -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "pi_123",
                    "amount": 4999,
                    "metadata": { "user_id": "user_7" }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_signature_header() {
        let header = "t=1234567890,v1=abc123,v1=def456";
        let parsed = parse_signature_header(header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures.len(), 2);
    }

    #[test]
    fn test_verify_valid_signature() {
        let secret = "whsec_test";
        let payload = succeeded_payload();
        let header = sign(secret, &payload, Utc::now().timestamp());

        let event = verify_event(secret, payload.as_bytes(), &header).unwrap();
        assert_eq!(event.event_type, WebhookEventType::PaymentSucceeded);
        assert_eq!(event.event_id, "evt_1");
    }

    #[test]
    fn test_verify_rejects_bad_signature() {
        let payload = succeeded_payload();
        let header = sign("whsec_wrong", &payload, Utc::now().timestamp());

        let err = verify_event("whsec_test", payload.as_bytes(), &header).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerification(_)));
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let secret = "whsec_test";
        let payload = succeeded_payload();
        let stale = Utc::now().timestamp() - 3600;
        let header = sign(secret, &payload, stale);

        let err = verify_event(secret, payload.as_bytes(), &header).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerification(_)));
    }

    #[test]
    fn test_intent_data_extraction() {
        let secret = "whsec_test";
        let payload = succeeded_payload();
        let header = sign(secret, &payload, Utc::now().timestamp());
        let event = verify_event(secret, payload.as_bytes(), &header).unwrap();

        let data = PaymentIntentData::from_event(&event).unwrap();
        assert_eq!(data.intent_id, "pi_123");
        assert_eq!(data.user_id.as_deref(), Some("user_7"));
        assert_eq!(data.amount, Some(4999));
    }

    struct CountingHandler {
        succeeded: AtomicUsize,
        failed: AtomicUsize,
    }

    #[async_trait]
    impl WebhookHandler for CountingHandler {
        async fn on_payment_succeeded(&self, _data: PaymentIntentData) -> PaymentResult<()> {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_payment_failed(&self, _data: PaymentIntentData) -> PaymentResult<()> {
            self.failed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_event_type() {
        let handler = CountingHandler {
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };

        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_value(serde_json::json!({ "id": "pi_x" })).unwrap();

        let succeeded = StripeEvent {
            event_id: "evt_a".to_string(),
            event_type: WebhookEventType::PaymentSucceeded,
            created: 0,
            object: object.clone(),
        };
        let failed = StripeEvent {
            event_id: "evt_b".to_string(),
            event_type: WebhookEventType::PaymentFailed,
            created: 0,
            object: object.clone(),
        };
        let unknown = StripeEvent {
            event_id: "evt_c".to_string(),
            event_type: WebhookEventType::Unknown("charge.refunded".to_string()),
            created: 0,
            object,
        };

        dispatch_event(&handler, succeeded).await.unwrap();
        dispatch_event(&handler, failed).await.unwrap();
        dispatch_event(&handler, unknown).await.unwrap();

        assert_eq!(handler.succeeded.load(Ordering::SeqCst), 1);
        assert_eq!(handler.failed.load(Ordering::SeqCst), 1);
    }
}
