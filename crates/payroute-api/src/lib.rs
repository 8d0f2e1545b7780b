//! # payroute-api
//!
//! HTTP route layer for payroute-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Validation and rate-limit middleware for the payment routes
//! - Webhook endpoint for Stripe payment events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/create-payment-intent` | Card payment (Stripe) |
//! | POST | `/create-paypal-order` | PayPal order creation |
//! | POST | `/capture-paypal-payment` | PayPal capture |
//! | POST | `/create-google-pay-payment` | Google Pay (Stripe) |
//! | POST | `/webhook` | Stripe webhook |

pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod validate;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
