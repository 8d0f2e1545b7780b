//! # payroute-stripe
//!
//! Stripe integration for payroute-rs: the REST client used by the card and
//! Google Pay routes, plus webhook signature verification and dispatch.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payroute_stripe::StripeClient;
//!
//! let client = StripeClient::from_env()?;
//!
//! let intent = client
//!     .create_payment_intent(49.99, "usd", "pm_abc", "user_1")
//!     .await?;
//! // Hand intent.client_secret back to the frontend
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use payroute_stripe::webhook::{verify_event, dispatch_event};
//!
//! let event = verify_event(client.webhook_secret(), &body, signature)?;
//! dispatch_event(&my_handler, event).await?;
//! ```

pub mod client;
pub mod config;
pub mod webhook;

// Re-exports
pub use client::{PaymentIntent, StripeClient};
pub use config::StripeConfig;
pub use webhook::{
    dispatch_event, verify_event, PaymentIntentData, StripeEvent, WebhookEventType, WebhookHandler,
};
