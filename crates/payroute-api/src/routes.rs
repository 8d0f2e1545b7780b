//! # Routes
//!
//! Axum router configuration for the payment route layer.
//!
//! - POST /create-payment-intent     - Card payment (Stripe)
//! - POST /create-paypal-order       - PayPal order creation
//! - POST /capture-paypal-payment    - PayPal capture + order record
//! - POST /create-google-pay-payment - Google Pay (Stripe)
//! - POST /webhook                   - Stripe webhook (signature-gated)
//! - GET  /health                    - Health check
//!
//! The validation middleware wraps the three creation routes (they carry the
//! method-tagged body); the rate limiter, when configured, wraps every
//! payment route but never the webhook.

use crate::handlers;
use crate::rate_limit::{self, RateLimiter};
use crate::state::AppState;
use crate::validate;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Creation routes carry the method-tagged body the validator expects
    let creation_routes = Router::new()
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route("/create-paypal-order", post(handlers::create_paypal_order))
        .route(
            "/create-google-pay-payment",
            post(handlers::create_google_pay_payment),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            validate::validate_payment,
        ));

    let mut payment_routes = creation_routes.route(
        "/capture-paypal-payment",
        post(handlers::capture_paypal_payment),
    );

    if let Some(rl) = state.config.rate_limit {
        let limiter = Arc::new(RateLimiter::new(
            rl.max_requests,
            Duration::from_secs(rl.window_secs),
        ));
        payment_routes = payment_routes.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::enforce,
        ));
    }

    Router::new()
        .route("/health", get(handlers::health))
        .merge(payment_routes)
        // Webhook accepts the raw body and is gated by signature, not auth
        .route("/webhook", post(handlers::stripe_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
