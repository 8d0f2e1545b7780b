//! # Payment Error Types
//!
//! Typed error handling for the payroute layer.
//! All payment operations return `Result<T, PaymentError>`.
//!
//! Every handler converts errors to an HTTP response through a single
//! translation keyed by `status_code()` -- vendor declines, incomplete
//! captures and collaborator faults are distinct kinds, not generic 500s.

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Field path (e.g., "amount", "paymentData.token")
    pub field: String,
    /// Human-readable rule violation
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request failed field-level validation
    #[error("Validation failed: {}", format_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    /// Production deployments require a transport-secure connection
    #[error("Secure connection required")]
    InsecureTransport,

    /// Caller identity missing (upstream auth did not run)
    #[error("Missing authenticated caller identity")]
    MissingCaller,

    /// Card was declined by the issuer
    #[error("Payment declined: {message}")]
    PaymentDeclined {
        message: String,
        code: Option<String>,
    },

    /// Capture succeeded at the vendor but did not complete
    #[error("Payment not completed: capture status {status}")]
    CaptureIncomplete { status: String },

    /// Too many requests from one source address
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    Provider {
        provider: String,
        message: String,
        code: Option<String>,
    },

    /// Network/HTTP error communicating with a provider
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Order-store collaborator failed to persist the confirmed order
    #[error("Order creation failed: {0}")]
    OrderPersist(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PaymentError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::Validation { .. } => 400,
            PaymentError::InsecureTransport => 403,
            PaymentError::MissingCaller => 401,
            PaymentError::PaymentDeclined { .. } => 402,
            PaymentError::CaptureIncomplete { .. } => 409,
            PaymentError::RateLimited { .. } => 429,
            PaymentError::Provider { .. } => 502,
            PaymentError::Network(_) => 503,
            PaymentError::WebhookVerification(_) => 400,
            PaymentError::WebhookParse(_) => 400,
            PaymentError::OrderPersist(_) => 500,
            PaymentError::Internal(_) => 500,
            PaymentError::Serialization(_) => 500,
        }
    }

    /// Vendor-assigned error code, if the vendor supplied one
    pub fn vendor_code(&self) -> Option<&str> {
        match self {
            PaymentError::PaymentDeclined { code, .. } => code.as_deref(),
            PaymentError::Provider { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Field violations, for 400 response bodies
    pub fn violations(&self) -> Option<&[FieldViolation]> {
        match self {
            PaymentError::Validation { violations } => Some(violations),
            _ => None,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
