//! # Payment Request Model
//!
//! Method-keyed request shapes for the payment routes.
//!
//! The inbound body is a tagged union on `method` (card, paypal, google_pay),
//! so rule selection is exhaustive pattern matching rather than runtime field
//! inspection. Validation collects every violation before reporting, so the
//! caller sees all of them at once.

use crate::error::FieldViolation;
use serde::{Deserialize, Serialize};

/// Maximum chargeable amount, in major currency units
pub const MAX_AMOUNT: f64 = 999_999.0;

/// Google Pay tokenized payment data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GooglePayData {
    /// Opaque network token produced by the Google Pay client SDK
    pub token: String,
}

/// An inbound payment request, keyed by payment method
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentRequest {
    /// Card charge through Stripe payment intents
    #[serde(rename_all = "camelCase")]
    Card {
        amount: f64,
        currency: String,
        payment_method_id: String,
    },
    /// PayPal order (captured in a second step)
    Paypal { amount: f64, currency: String },
    /// Google Pay token charged through Stripe
    #[serde(rename_all = "camelCase")]
    GooglePay {
        amount: f64,
        currency: String,
        payment_data: GooglePayData,
    },
}

impl PaymentRequest {
    /// Amount in major currency units as sent by the client
    pub fn amount(&self) -> f64 {
        match self {
            PaymentRequest::Card { amount, .. }
            | PaymentRequest::Paypal { amount, .. }
            | PaymentRequest::GooglePay { amount, .. } => *amount,
        }
    }

    /// Currency code as sent by the client
    pub fn currency(&self) -> &str {
        match self {
            PaymentRequest::Card { currency, .. }
            | PaymentRequest::Paypal { currency, .. }
            | PaymentRequest::GooglePay { currency, .. } => currency,
        }
    }

    /// Method name for logging and order records
    pub fn method_name(&self) -> &'static str {
        match self {
            PaymentRequest::Card { .. } => "card",
            PaymentRequest::Paypal { .. } => "paypal",
            PaymentRequest::GooglePay { .. } => "google_pay",
        }
    }

    /// Validate field rules for the declared method.
    ///
    /// Collects all violations rather than failing on the first, so a 400
    /// response can mirror every problem in one `details` array.
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        validate_amount(self.amount(), &mut violations);
        validate_currency(self.currency(), &mut violations);

        match self {
            PaymentRequest::Card {
                payment_method_id, ..
            } => {
                if payment_method_id.trim().is_empty() {
                    violations.push(FieldViolation::new("paymentMethodId", "is required"));
                }
            }
            PaymentRequest::Paypal { .. } => {}
            PaymentRequest::GooglePay { payment_data, .. } => {
                if payment_data.token.trim().is_empty() {
                    violations.push(FieldViolation::new("paymentData.token", "is required"));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn validate_amount(amount: f64, violations: &mut Vec<FieldViolation>) {
    if !amount.is_finite() || amount <= 0.0 {
        violations.push(FieldViolation::new("amount", "must be a positive number"));
    } else if amount > MAX_AMOUNT {
        violations.push(FieldViolation::new("amount", "must not exceed 999999"));
    }
}

fn validate_currency(currency: &str, violations: &mut Vec<FieldViolation>) {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        violations.push(FieldViolation::new(
            "currency",
            "must be a 3-letter currency code",
        ));
    }
}

/// Convert a major-unit amount to the smallest currency unit.
///
/// JPY is zero-decimal; everything else this layer sees uses two decimals.
pub fn minor_units(amount: f64, currency: &str) -> i64 {
    if currency.eq_ignore_ascii_case("jpy") {
        amount.round() as i64
    } else {
        (amount * 100.0).round() as i64
    }
}

/// Format a major-unit amount the way PayPal's `value` field expects
pub fn decimal_string(amount: f64, currency: &str) -> String {
    if currency.eq_ignore_ascii_case("jpy") {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}
