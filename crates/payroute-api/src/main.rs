//! # Payroute RS
//!
//! Payment-processing route layer: card (Stripe), PayPal, and Google Pay
//! (Stripe), reconciled through signed Stripe webhooks.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export FRONTEND_BASE_URL=https://shop.example
//! export PAYPAL_CLIENT_ID=...
//! export PAYPAL_CLIENT_SECRET=...
//!
//! # Run the server
//! payroute
//! ```

use payroute_api::{routes, state::AppState};
use std::net::SocketAddr;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    match state.config.rate_limit {
        Some(rl) => info!(
            "Rate limit: {} requests / {}s per address",
            rl.max_requests, rl.window_secs
        ),
        None => info!("Rate limit: disabled"),
    }

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Payroute starting on http://{}", addr);

    if !is_prod {
        info!("Card payments: POST http://{}/create-payment-intent", addr);
        info!("Webhook: POST http://{}/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
