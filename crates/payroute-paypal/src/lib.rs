//! # payroute-paypal
//!
//! PayPal Orders API client for payroute-rs: order creation (intent CAPTURE)
//! and capture, authenticated per call via OAuth client credentials.
//!
//! ```rust,ignore
//! use payroute_paypal::PayPalClient;
//!
//! let client = PayPalClient::from_env()?;
//! let order_id = client.create_order(24.99, "usd").await?;
//!
//! // After buyer approval:
//! let capture = client.capture_order(&order_id).await?;
//! if capture.is_completed() { /* persist the order */ }
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::{CaptureResult, PayPalClient};
pub use config::PayPalConfig;
