//! # Validation Middleware
//!
//! Inspects the declared payment method, applies method-specific field rules,
//! and enforces amount bounds and transport security before any handler (or
//! vendor client) runs. All field violations are collected into one response.

use crate::handlers::error_response;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use payroute_core::{FieldViolation, PaymentError, PaymentRequest};
use tracing::warn;

/// Largest request body the payment routes accept
const BODY_LIMIT: usize = 64 * 1024;

fn is_transport_secure(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Middleware for the payment-creation routes.
///
/// Order of checks: transport security first (production only), then the
/// method-keyed field rules. On success the buffered body is reinstated and
/// control passes onward unchanged.
pub async fn validate_payment(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.is_production() && !is_transport_secure(request.headers()) {
        warn!("Rejected insecure request in production mode");
        return error_response(&PaymentError::InsecureTransport).into_response();
    }

    let (parts, body) = request.into_parts();

    let bytes: Bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(&PaymentError::Internal(format!(
                "Failed to read request body: {}",
                e
            )))
            .into_response();
        }
    };

    // Unknown method fails here (tagged-union deserialization), before any
    // field rules run and before any vendor call.
    let payment: PaymentRequest = match serde_json::from_slice(&bytes) {
        Ok(payment) => payment,
        Err(e) => {
            warn!("Rejected malformed payment request: {}", e);
            return error_response(&PaymentError::Validation {
                violations: vec![FieldViolation::new("body", e.to_string())],
            })
            .into_response();
        }
    };

    if let Err(violations) = payment.validate() {
        warn!(
            "Rejected payment request: {} violation(s) for method {}",
            violations.len(),
            payment.method_name()
        );
        return error_response(&PaymentError::Validation { violations }).into_response();
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}
