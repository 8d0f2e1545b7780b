//! # payroute-core
//!
//! Core types for the payroute payment route layer.
//!
//! This crate provides:
//! - `PaymentRequest` tagged union with method-keyed validation
//! - `PaymentError` for typed error handling across all routes
//! - `OrderRecord` and the `OrderStore` collaborator trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use payroute_core::{PaymentRequest, OrderRecord, PaymentMethod};
//!
//! let request: PaymentRequest = serde_json::from_slice(&body)?;
//! request.validate().map_err(|violations| {
//!     PaymentError::Validation { violations }
//! })?;
//!
//! // After a confirmed capture:
//! store
//!     .create_order(OrderRecord::confirmed(user_id, order_id, PaymentMethod::Paypal))
//!     .await?;
//! ```

pub mod error;
pub mod order;
pub mod payment;

// Re-exports for convenience
pub use error::{FieldViolation, PaymentError, PaymentResult};
pub use order::{
    HttpOrderStore, LoggingOrderStore, OrderRecord, OrderStatus, OrderStore, PaymentMethod,
};
pub use payment::{decimal_string, minor_units, GooglePayData, PaymentRequest, MAX_AMOUNT};
