//! # Request Handlers
//!
//! Axum request handlers for the payment routes. Each handler performs one
//! call sequence against a vendor client and maps the result (or the typed
//! error) to an HTTP response through a single translation layer.

use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use payroute_core::{
    FieldViolation, OrderRecord, OrderStore, PaymentError, PaymentMethod, PaymentRequest,
    PaymentResult,
};
use payroute_stripe::webhook::{dispatch_event, verify_event, PaymentIntentData, WebhookHandler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Card payment-intent response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// PayPal order-creation response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaypalOrderResponse {
    pub order_id: String,
}

/// PayPal capture request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub order_id: String,
}

/// PayPal capture response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub success: bool,
    pub capture_id: Option<String>,
}

/// Google Pay payment response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayResponse {
    pub success: bool,
    pub payment_intent_id: String,
}

/// Error response body: `{ "error": { "message", ["code"], ["details"] } }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                code: None,
                details: None,
            },
        }
    }
}

/// The single error-to-response translation, keyed by the error taxonomy
pub fn error_response(err: &PaymentError) -> (StatusCode, Json<ErrorBody>) {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = ErrorBody {
        error: ErrorDetail {
            message: err.to_string(),
            code: err.vendor_code().map(String::from),
            details: err.violations().map(|v| v.to_vec()),
        },
    };

    (status, Json(body))
}

// =============================================================================
// Caller Identity
// =============================================================================

/// Authenticated caller id, injected upstream as `x-user-id`.
/// Authentication itself happens before the request reaches this layer.
#[derive(Debug, Clone)]
pub struct CallerId(pub String);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| CallerId(v.to_string()))
            .ok_or_else(|| error_response(&PaymentError::MissingCaller))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "payroute",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn method_mismatch(expected: &str) -> (StatusCode, Json<ErrorBody>) {
    error_response(&PaymentError::Validation {
        violations: vec![FieldViolation::new(
            "method",
            format!("must be \"{}\" for this route", expected),
        )],
    })
}

/// Create and confirm a card payment intent
#[instrument(skip(state, request, caller))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    caller: CallerId,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<CreateIntentResponse>, (StatusCode, Json<ErrorBody>)> {
    let PaymentRequest::Card {
        amount,
        currency,
        payment_method_id,
    } = request
    else {
        return Err(method_mismatch("card"));
    };

    let intent = state
        .stripe
        .create_payment_intent(amount, &currency, &payment_method_id, &caller.0)
        .await
        .map_err(|e| {
            error!("Failed to create payment intent: {}", e);
            error_response(&e)
        })?;

    info!("Payment intent created: {}", intent.id);

    Ok(Json(CreateIntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    }))
}

/// Create a PayPal order (captured later by the client-approved flow)
#[instrument(skip(state, request, _caller))]
pub async fn create_paypal_order(
    State(state): State<AppState>,
    _caller: CallerId,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<CreatePaypalOrderResponse>, (StatusCode, Json<ErrorBody>)> {
    let PaymentRequest::Paypal { amount, currency } = request else {
        return Err(method_mismatch("paypal"));
    };

    let order_id = state
        .paypal
        .create_order(amount, &currency)
        .await
        .map_err(|e| {
            error!("Failed to create PayPal order: {}", e);
            error_response(&e)
        })?;

    Ok(Json(CreatePaypalOrderResponse { order_id }))
}

/// Capture an approved PayPal order and persist the confirmed order record
#[instrument(skip(state, caller), fields(order_id = %request.order_id))]
pub async fn capture_paypal_payment(
    State(state): State<AppState>,
    caller: CallerId,
    Json(request): Json<CaptureRequest>,
) -> Result<Json<CaptureResponse>, (StatusCode, Json<ErrorBody>)> {
    if request.order_id.trim().is_empty() {
        return Err(error_response(&PaymentError::Validation {
            violations: vec![FieldViolation::new("orderId", "is required")],
        }));
    }

    let capture = state
        .paypal
        .capture_order(&request.order_id)
        .await
        .map_err(|e| {
            error!("Failed to capture PayPal order: {}", e);
            error_response(&e)
        })?;

    if !capture.is_completed() {
        warn!(
            "Capture did not complete: order={}, status={}",
            request.order_id, capture.status
        );
        return Err(error_response(&PaymentError::CaptureIncomplete {
            status: capture.status,
        }));
    }

    state
        .orders
        .create_order(OrderRecord::confirmed(
            caller.0.clone(),
            request.order_id.clone(),
            PaymentMethod::Paypal,
        ))
        .await
        .map_err(|e| {
            error!("Order creation failed after capture: {}", e);
            error_response(&e)
        })?;

    Ok(Json(CaptureResponse {
        success: true,
        capture_id: capture.capture_id,
    }))
}

/// Charge a Google Pay token through Stripe
#[instrument(skip(state, request, caller))]
pub async fn create_google_pay_payment(
    State(state): State<AppState>,
    caller: CallerId,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<GooglePayResponse>, (StatusCode, Json<ErrorBody>)> {
    let PaymentRequest::GooglePay {
        amount,
        currency,
        payment_data,
    } = request
    else {
        return Err(method_mismatch("google_pay"));
    };

    let intent = state
        .stripe
        .charge_google_pay(amount, &currency, &payment_data.token, &caller.0)
        .await
        .map_err(|e| {
            error!("Google Pay payment failed: {}", e);
            error_response(&e)
        })?;

    Ok(Json(GooglePayResponse {
        success: true,
        payment_intent_id: intent.id,
    }))
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook handler that records confirmed card orders
pub struct OrderRecordingHandler {
    orders: Arc<dyn OrderStore>,
}

impl OrderRecordingHandler {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl WebhookHandler for OrderRecordingHandler {
    async fn on_payment_succeeded(&self, data: PaymentIntentData) -> PaymentResult<()> {
        let user_id = data.user_id.ok_or_else(|| {
            PaymentError::WebhookParse("Intent metadata missing user_id".to_string())
        })?;

        info!("Payment succeeded: intent={}, user={}", data.intent_id, user_id);

        self.orders
            .create_order(OrderRecord::confirmed(
                user_id,
                data.intent_id,
                PaymentMethod::Card,
            ))
            .await
    }
}

/// Handle a Stripe webhook: verify the signature over the raw body, dispatch
/// on event type, acknowledge receipt
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(&PaymentError::WebhookVerification(
                "Missing Stripe-Signature header".to_string(),
            ))
        })?;

    let event =
        verify_event(state.stripe.webhook_secret(), &body, signature).map_err(|e| {
            error!("Webhook verification failed: {}", e);
            error_response(&e)
        })?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    let handler = OrderRecordingHandler::new(state.orders.clone());
    // The vendor retries on 5xx, so dispatch faults surface only as a
    // generic server error.
    dispatch_event(&handler, event).await.map_err(|e| {
        error!("Webhook handler error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::message("Webhook processing failed")),
        )
    })?;

    Ok(Json(serde_json::json!({ "received": true })))
}
